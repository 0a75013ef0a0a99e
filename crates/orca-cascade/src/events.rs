//! Cascade events and notifiers for observability.
//!
//! Events are emitted during a run so a host can observe progress, stream it
//! to a UI or route it to whatever sink it uses. The engine also logs every
//! event through `tracing`; notifiers are for consumers that want typed values.

use orca_workflow::BlockId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during a cascade run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CascadeEvent {
  /// A run has started.
  RunStarted { run_id: String, workflow: String },

  /// A label selected at least one unclaimed block.
  WaveStarted {
    run_id: String,
    label: String,
    block_ids: Vec<BlockId>,
  },

  /// A block was claimed and is about to be dispatched.
  BlockClaimed {
    run_id: String,
    block_id: BlockId,
    activity_id: String,
  },

  /// A block's activity returned its expected code.
  BlockSucceeded {
    run_id: String,
    block_id: BlockId,
    activity_id: String,
    code: String,
  },

  /// A block's activity returned a code other than the expected one.
  BlockMismatch {
    run_id: String,
    block_id: BlockId,
    activity_id: String,
    expected: String,
    actual: String,
  },

  /// A block's activity could not produce an outcome.
  BlockFailed {
    run_id: String,
    block_id: BlockId,
    activity_id: String,
    error: String,
  },

  /// A validated block satisfied its postcondition.
  LabelSatisfied {
    run_id: String,
    label: String,
    block_id: BlockId,
  },

  /// The run finished.
  RunCompleted {
    run_id: String,
    executed: usize,
    succeeded: usize,
    failed: usize,
    quiescent: bool,
  },
}

/// Trait for receiving cascade events.
///
/// `notify` is called from whichever task produced the event, so
/// implementations must be cheap and must not block.
pub trait CascadeNotifier: Send + Sync {
  fn notify(&self, event: CascadeEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl CascadeNotifier for NoopNotifier {
  fn notify(&self, _event: CascadeEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a wave. Volume is a handful of
  // events per block.
  sender: mpsc::UnboundedSender<CascadeEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<CascadeEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<CascadeEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl CascadeNotifier for ChannelNotifier {
  fn notify(&self, event: CascadeEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
