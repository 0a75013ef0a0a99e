use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while setting up a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("endpoint pool must contain at least one endpoint")]
  EmptyPool,

  #[error("invalid endpoint url '{endpoint}'")]
  InvalidEndpoint {
    endpoint: String,
    #[source]
    source: url::ParseError,
  },

  #[error("failed to read rows from {}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse rows: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("failed to parse csv rows: {0}")]
  Csv(#[from] csv::Error),

  #[error("row {row} is not a JSON object")]
  NotAnObject { row: usize },
}

/// Errors a transport reports for a single send.
///
/// These never abort a dispatch; they become `failed` results.
#[derive(Debug, Error)]
pub enum TransportError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{0}")]
  Other(String),
}
