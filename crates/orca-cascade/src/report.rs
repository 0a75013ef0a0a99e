//! Run results.

use orca_workflow::BlockId;
use serde::{Deserialize, Serialize};

/// What happened to a dispatched block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BlockStatus {
  /// The activity returned its expected code; the postcondition was cascaded.
  Succeeded { code: String },
  /// The activity returned some other code; nothing was cascaded.
  Mismatch { expected: String, actual: String },
  /// The runner could not produce an outcome; nothing was cascaded.
  RunnerFailed { message: String },
}

impl BlockStatus {
  pub fn is_success(&self) -> bool {
    matches!(self, BlockStatus::Succeeded { .. })
  }
}

/// Outcome of one dispatched block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockOutcome {
  pub block_id: BlockId,
  pub activity_id: String,
  pub pre_requirement: String,
  pub post_requirement: String,
  #[serde(flatten)]
  pub status: BlockStatus,
  /// Wall time spent in the runner, in milliseconds.
  pub elapsed_ms: u64,
}

/// Result of a cascade run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
  pub run_id: String,
  pub workflow: String,
  /// Outcomes of every dispatched block, ordered by block id.
  pub outcomes: Vec<BlockOutcome>,
  /// False when cancellation stopped the cascade before it ran out of blocks.
  pub quiescent: bool,
  pub elapsed_ms: u64,
}

impl RunReport {
  /// Number of blocks dispatched.
  pub fn executed(&self) -> usize {
    self.outcomes.len()
  }

  pub fn succeeded(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|o| o.status.is_success())
      .count()
  }

  /// Blocks that failed validation or execution.
  pub fn failed(&self) -> usize {
    self.executed() - self.succeeded()
  }

  pub fn outcome(&self, block_id: BlockId) -> Option<&BlockOutcome> {
    self.outcomes.iter().find(|o| o.block_id == block_id)
  }

  /// Ids of blocks that were dispatched, in order.
  pub fn executed_blocks(&self) -> Vec<BlockId> {
    self.outcomes.iter().map(|o| o.block_id).collect()
  }
}
