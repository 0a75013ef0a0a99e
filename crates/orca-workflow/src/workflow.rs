use crate::block::{Block, BlockId};
use crate::error::WorkflowError;
use crate::graph::Graph;

/// A locked workflow ready for execution.
#[derive(Debug, Clone)]
pub struct Workflow {
  name: String,
  blocks: Vec<Block>,
  graph: Graph,
}

impl Workflow {
  /// Build a workflow from blocks whose ids match their positions.
  pub fn new(name: impl Into<String>, blocks: Vec<Block>) -> Result<Self, WorkflowError> {
    for (position, block) in blocks.iter().enumerate() {
      if block.block_id.index() != position {
        return Err(WorkflowError::BlockIdMismatch {
          position,
          block_id: block.block_id,
        });
      }
    }

    let graph = Graph::new(&blocks);
    Ok(Self {
      name: name.into(),
      blocks,
      graph,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn blocks(&self) -> &[Block] {
    &self.blocks
  }

  /// The label index.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Get a block by ID.
  pub fn get_block(&self, block_id: BlockId) -> Option<&Block> {
    self.blocks.get(block_id.index())
  }

  /// Get a block by ID, failing if it does not belong to this workflow.
  pub fn block(&self, block_id: BlockId) -> Result<&Block, WorkflowError> {
    self
      .get_block(block_id)
      .ok_or(WorkflowError::BlockNotFound(block_id))
  }

  /// Blocks gated on `label`, in block order.
  pub fn blocks_gated_on<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a Block> + use<'a> {
    self
      .graph
      .gated_on(label)
      .iter()
      .filter_map(|id| self.get_block(*id))
  }
}
