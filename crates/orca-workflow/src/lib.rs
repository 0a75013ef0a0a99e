//! Orca Workflow
//!
//! This crate provides the "locked" workflow representation for orca.
//! A locked workflow is the loaded, immutable form of a workflow definition
//! that the cascade engine executes.
//!
//! Key differences from `orca-config`:
//! - Every block carries an explicit [`BlockId`] assigned at load time
//! - Labels are indexed, so "which blocks are gated on this label" is a lookup
//! - The workflow never changes after construction and is shared by `Arc`

mod block;
mod error;
mod graph;
mod workflow;

pub use block::{Activity, Block, BlockId, Label};
pub use error::WorkflowError;
pub use graph::Graph;
pub use orca_config::START_LABEL;
pub use workflow::Workflow;
