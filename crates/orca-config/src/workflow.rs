use serde::{Deserialize, Serialize};

use crate::block::BlockDef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDef {
  /// Human readable workflow name.
  #[serde(rename = "workflow")]
  pub name: String,
  pub blocks: Vec<BlockDef>,
}

impl WorkflowDef {
  /// Parse a definition from JSON text.
  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }
}
