//! Cascade engine for orca.
//!
//! Blocks are gated on labels. Satisfying a label dispatches every unclaimed
//! block gated on it, concurrently; each block whose activity returns its
//! expected code satisfies its own postcondition, which cascades further.
//!
//! # Architecture
//!
//! ```text
//! CascadeEngine
//! ├── execute(workflow, cancel) -> RunReport
//! └── start(workflow, cancel) -> CascadeRun
//!
//! CascadeRun
//! ├── cascade(label) - select (try_claim), dispatch wave, join subtree
//! └── finish() -> RunReport
//!
//! WorkflowRunner
//! └── start(cancel) - executes queued RunRequests, one tracker per run
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use orca_cascade::{CascadeEngine, EngineConfig};
//! use orca_activity_runtime::SimulatedRunner;
//!
//! let engine = CascadeEngine::new(EngineConfig::default(), SimulatedRunner::default());
//! let report = engine.execute(Arc::new(workflow), CancellationToken::new()).await;
//! println!("{} blocks ran, {} failed", report.executed(), report.failed());
//! ```

mod engine;
mod error;
mod events;
mod report;
mod run;
mod runner;
mod tracker;

pub use engine::{CascadeEngine, EngineConfig};
pub use error::CascadeError;
pub use events::{CascadeEvent, CascadeNotifier, ChannelNotifier, NoopNotifier};
pub use report::{BlockOutcome, BlockStatus, RunReport};
pub use run::CascadeRun;
pub use runner::{RunRequest, WorkflowRunner, submit};
pub use tracker::{ExecutionTracker, InMemoryTracker};
