use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use orca_config::{BlockDef, WorkflowDef};
use orca_workflow::{Activity, Block, BlockId, Workflow};
use tracing::{debug, warn};

use crate::error::LoadError;

/// Loader transforms a WorkflowDef into a locked Workflow.
#[async_trait]
pub trait Loader: Send + Sync {
  /// Load a workflow definition into a locked workflow.
  ///
  /// This process:
  /// 1. Validates the structure (non-empty fields, unique activity ids)
  /// 2. Assigns each block an id from its position
  /// 3. Builds the label index
  async fn load(&self, def: WorkflowDef) -> Result<Workflow, LoadError>;
}

/// Standard loader implementation.
///
/// Duplicate pre/post requirements are valid (fan-out and fan-in of labels).
/// A workflow without any block gated on the start label loads fine and
/// simply does nothing when run.
#[derive(Debug, Clone, Default)]
pub struct StandardLoader;

impl StandardLoader {
  pub fn new() -> Self {
    Self
  }

  fn validate_block(block_index: usize, def: &BlockDef) -> Result<(), LoadError> {
    let fields = [
      ("preRequirement", &def.pre_requirement),
      ("postRequirement", &def.post_requirement),
      ("activityId", &def.activity.activity_id),
      ("scriptRef", &def.activity.script_ref),
      ("expectedCode", &def.activity.expected_code),
    ];

    for (field, value) in fields {
      if value.is_empty() {
        return Err(LoadError::EmptyField { block_index, field });
      }
    }
    Ok(())
  }

  fn lock_block(block_index: usize, def: BlockDef) -> Block {
    Block {
      block_id: BlockId(block_index),
      pre_requirement: def.pre_requirement,
      activity: Activity {
        activity_id: def.activity.activity_id,
        script_ref: def.activity.script_ref,
        expected_code: def.activity.expected_code,
      },
      post_requirement: def.post_requirement,
    }
  }
}

#[async_trait]
impl Loader for StandardLoader {
  async fn load(&self, def: WorkflowDef) -> Result<Workflow, LoadError> {
    if def.name.is_empty() {
      return Err(LoadError::EmptyName);
    }

    let mut activity_ids = HashSet::new();
    for (block_index, block) in def.blocks.iter().enumerate() {
      Self::validate_block(block_index, block)?;
      if !activity_ids.insert(block.activity.activity_id.as_str()) {
        return Err(LoadError::DuplicateActivityId {
          activity_id: block.activity.activity_id.clone(),
        });
      }
    }

    let blocks = def
      .blocks
      .into_iter()
      .enumerate()
      .map(|(block_index, block)| Self::lock_block(block_index, block))
      .collect();

    let workflow = Workflow::new(def.name, blocks)?;
    let graph = workflow.graph();

    if graph.entry_points().is_empty() {
      warn!(
        workflow = %workflow.name(),
        "no block is gated on the start label; runs will do nothing"
      );
    }
    for label in graph.unsatisfiable_labels() {
      warn!(
        workflow = %workflow.name(),
        label,
        blocks = ?graph.gated_on(label),
        "label is never produced; blocks gated on it are unreachable"
      );
    }

    debug!(
      workflow = %workflow.name(),
      blocks = workflow.blocks().len(),
      "workflow loaded"
    );

    Ok(workflow)
  }
}

/// Parse a workflow definition from JSON text.
pub fn parse_definition(content: &str) -> Result<WorkflowDef, LoadError> {
  Ok(WorkflowDef::from_json(content)?)
}

/// Read and parse a workflow definition file.
pub async fn read_definition(path: &Path) -> Result<WorkflowDef, LoadError> {
  let content = tokio::fs::read_to_string(path)
    .await
    .map_err(|source| LoadError::Io {
      path: path.to_path_buf(),
      source,
    })?;
  parse_definition(&content)
}
