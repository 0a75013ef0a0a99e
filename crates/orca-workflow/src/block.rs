use std::fmt;

use serde::{Deserialize, Serialize};

/// A requirement label. Used both as a block's gate and as its output signal.
pub type Label = String;

/// Stable identity of a block within one workflow.
///
/// Assigned by the loader from the block's position in the definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub usize);

impl BlockId {
  pub fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for BlockId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "block-{}", self.0)
  }
}

/// A unit of executable work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
  /// Identifier used for logging and tracing only.
  pub activity_id: String,
  /// Opaque reference resolved by the activity runner.
  pub script_ref: String,
  /// Outcome code that counts as success.
  pub expected_code: String,
}

impl Activity {
  /// Check an outcome code against the expected code.
  pub fn accepts(&self, code: &str) -> bool {
    self.expected_code == code
  }
}

/// A node in the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
  pub block_id: BlockId,
  pub pre_requirement: Label,
  pub activity: Activity,
  pub post_requirement: Label,
}
