use serde::{Deserialize, Serialize};

/// An activity as written in a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDef {
  pub activity_id: String,
  /// Opaque reference to the logic that runs this activity.
  #[serde(alias = "script")]
  pub script_ref: String,
  /// Outcome code the activity must return for its block to succeed.
  #[serde(alias = "activityCode")]
  pub expected_code: String,
}

/// A gated unit of work as written in a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDef {
  pub pre_requirement: String,
  pub activity: ActivityDef,
  pub post_requirement: String,
}
