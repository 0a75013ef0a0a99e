//! Runner errors.

/// Errors an activity runner can report instead of an outcome code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivityError {
  /// No executor is registered for the activity's script reference.
  #[error("no handler registered for script '{script_ref}' (activity '{activity_id}')")]
  UnknownScript {
    activity_id: String,
    script_ref: String,
  },

  /// The executor ran but could not produce an outcome.
  #[error("activity '{activity_id}' failed: {message}")]
  Failed { activity_id: String, message: String },

  /// The executor did not finish in time.
  #[error("activity '{activity_id}' timed out after {timeout_ms}ms")]
  Timeout { activity_id: String, timeout_ms: u64 },
}

impl ActivityError {
  pub fn failed(activity_id: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Failed {
      activity_id: activity_id.into(),
      message: message.into(),
    }
  }
}
