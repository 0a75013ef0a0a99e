//! Runner loop errors.
//!
//! Block-level failures never surface here; they are recorded in the run report.

#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
  /// The runner loop has stopped and no longer accepts runs.
  #[error("workflow runner channel closed")]
  ChannelClosed,

  /// The run was queued but the runner stopped before reporting it.
  #[error("workflow runner dropped the run before it completed")]
  RunDropped,
}
