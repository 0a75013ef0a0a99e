mod error;
mod loader;

pub use error::LoadError;
pub use loader::{Loader, StandardLoader, parse_definition, read_definition};
