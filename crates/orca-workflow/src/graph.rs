use std::collections::{BTreeSet, HashMap};

use orca_config::START_LABEL;

use crate::block::{Block, BlockId};

/// Label index for traversal and analysis.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  /// label -> blocks gated on it, in block order.
  gated: HashMap<String, Vec<BlockId>>,
  /// label -> blocks that emit it on success, in block order.
  producers: HashMap<String, Vec<BlockId>>,
}

impl Graph {
  /// Build the index from blocks.
  pub fn new(blocks: &[Block]) -> Self {
    let mut gated: HashMap<String, Vec<BlockId>> = HashMap::new();
    let mut producers: HashMap<String, Vec<BlockId>> = HashMap::new();

    for block in blocks {
      gated
        .entry(block.pre_requirement.clone())
        .or_default()
        .push(block.block_id);
      producers
        .entry(block.post_requirement.clone())
        .or_default()
        .push(block.block_id);
    }

    Self { gated, producers }
  }

  /// Blocks whose precondition is `label`.
  pub fn gated_on(&self, label: &str) -> &[BlockId] {
    self.gated.get(label).map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Blocks whose postcondition is `label`.
  pub fn producers_of(&self, label: &str) -> &[BlockId] {
    self
      .producers
      .get(label)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Blocks gated on the start label.
  pub fn entry_points(&self) -> &[BlockId] {
    self.gated_on(START_LABEL)
  }

  /// Preconditions that are neither the start label nor produced by any block.
  ///
  /// Blocks gated on these can never fire.
  pub fn unsatisfiable_labels(&self) -> BTreeSet<&str> {
    self
      .gated
      .keys()
      .filter(|label| label.as_str() != START_LABEL && !self.producers.contains_key(*label))
      .map(|label| label.as_str())
      .collect()
  }

  /// Postconditions no block is gated on. Cascades end at these.
  pub fn terminal_labels(&self) -> BTreeSet<&str> {
    self
      .producers
      .keys()
      .filter(|label| !self.gated.contains_key(*label))
      .map(|label| label.as_str())
      .collect()
  }
}
