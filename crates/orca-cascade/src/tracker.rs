//! Execution tracking.
//!
//! A tracker records which blocks have been dispatched during one run.
//! Claiming is the only way a block moves from eligible to dispatched, so a
//! block that has been claimed once is never run again within that run.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Mutex;

use orca_workflow::BlockId;

/// The claim set of a single run.
///
/// Implementations must make [`try_claim`](ExecutionTracker::try_claim)
/// atomic: of any number of concurrent claims on one id, exactly one wins.
pub trait ExecutionTracker: Send + Sync + Debug {
  /// Claim `block_id` if nobody has yet. Returns `false` if it was already claimed.
  fn try_claim(&self, block_id: BlockId) -> bool;

  /// Whether `block_id` has been claimed.
  fn is_claimed(&self, block_id: BlockId) -> bool;

  /// All claimed ids, in ascending order.
  fn claimed(&self) -> Vec<BlockId>;

  fn len(&self) -> usize {
    self.claimed().len()
  }

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Mutex-guarded in-memory claim set.
#[derive(Debug, Default)]
pub struct InMemoryTracker {
  claimed: Mutex<HashSet<BlockId>>,
}

impl InMemoryTracker {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<BlockId>> {
    // The set is only ever inserted into, so a poisoned guard still holds valid data.
    self.claimed.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl ExecutionTracker for InMemoryTracker {
  fn try_claim(&self, block_id: BlockId) -> bool {
    self.lock().insert(block_id)
  }

  fn is_claimed(&self, block_id: BlockId) -> bool {
    self.lock().contains(&block_id)
  }

  fn claimed(&self) -> Vec<BlockId> {
    let mut ids: Vec<BlockId> = self.lock().iter().copied().collect();
    ids.sort();
    ids
  }

  fn len(&self) -> usize {
    self.lock().len()
  }
}
