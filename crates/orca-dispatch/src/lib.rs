//! Orca Dispatch
//!
//! Fans independent rows out across a fixed pool of remote endpoints.
//! Row `i` always goes to endpoint `i % pool.len()`; the [`Strategy`] only
//! decides how many requests are in flight at once:
//!
//! - [`Strategy::Wide`]: split rows into batches, send every batch and every
//!   row at the same time.
//! - [`Strategy::Narrow`]: send one row per endpoint, wait for the chunk, repeat.
//!
//! There is no dependency structure here. Activities that need to push rows
//! to remote services call into this crate; the cascade engine never does.

mod dispatcher;
mod error;
mod pool;
mod report;
mod rows;
mod transport;

pub use dispatcher::{Dispatcher, Strategy};
pub use error::{DispatchError, TransportError};
pub use pool::EndpointPool;
pub use report::{DispatchReport, DispatchResult, format_duration};
pub use rows::{load_rows, parse_rows};
pub use transport::{HttpTransport, Transport};
