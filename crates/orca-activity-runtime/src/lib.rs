//! Activity runtime for orca.
//!
//! The cascade engine never interprets an activity's `script_ref`. It hands the
//! whole [`Activity`](orca_workflow::Activity) to an [`ActivityRunner`] and gets
//! back an outcome code or an [`ActivityError`].
//!
//! # Runners
//!
//! ```text
//! ActivityRunner (trait)
//! ├── SimulatedRunner - sleeps, then returns the expected code
//! └── HandlerRunner   - looks up script_ref in a table of ActivityHandlers
//! ```

mod error;
mod handler;
mod runner;
mod simulated;

pub use error::ActivityError;
pub use handler::{ActivityHandler, HandlerRunner};
pub use runner::{ActivityRunner, OutcomeCode};
pub use simulated::SimulatedRunner;
