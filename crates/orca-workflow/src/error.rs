use thiserror::Error;

use crate::block::BlockId;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("block at position {position} has id {block_id}; ids must match positions")]
  BlockIdMismatch { position: usize, block_id: BlockId },

  #[error("block not found: {0}")]
  BlockNotFound(BlockId),
}
