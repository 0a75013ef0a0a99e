//! Orca Config
//!
//! This crate contains the serializable workflow definition types for orca.
//! These types represent a workflow before it is loaded: no block ids have
//! been assigned and nothing has been validated.
//!
//! Definitions are usually read from JSON files:
//!
//! ```json
//! {
//!   "workflow": "onboarding",
//!   "blocks": [
//!     {
//!       "preRequirement": "START",
//!       "activity": {
//!         "activityId": "create-account",
//!         "scriptRef": "scripts/create_account.js",
//!         "expectedCode": "OK"
//!       },
//!       "postRequirement": "ACCOUNT_CREATED"
//!     }
//!   ]
//! }
//! ```
//!
//! The loader turns a [`WorkflowDef`] into a locked workflow graph.

mod block;
mod workflow;

pub use block::{ActivityDef, BlockDef};
pub use workflow::WorkflowDef;

/// The reserved label that seeds every run.
pub const START_LABEL: &str = "START";
