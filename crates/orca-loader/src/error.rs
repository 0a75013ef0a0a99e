use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a workflow definition.
///
/// All of these are fatal to a run: they surface before any block executes.
#[derive(Debug, Error)]
pub enum LoadError {
  /// The definition file could not be read.
  #[error("failed to read workflow definition {}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The definition is not valid JSON or is missing required fields.
  #[error("failed to parse workflow definition: {0}")]
  Parse(#[from] serde_json::Error),

  /// The workflow name is empty.
  #[error("workflow name must not be empty")]
  EmptyName,

  /// A required string field of a block is empty.
  #[error("block {block_index}: field '{field}' must not be empty")]
  EmptyField {
    block_index: usize,
    field: &'static str,
  },

  /// Two blocks share an activity id.
  #[error("duplicate activity id: {activity_id}")]
  DuplicateActivityId { activity_id: String },

  /// The loaded blocks did not form a valid workflow.
  #[error("invalid workflow: {0}")]
  Workflow(#[from] orca_workflow::WorkflowError),
}
