use std::sync::Arc;

use async_trait::async_trait;
use orca_workflow::Activity;

use crate::error::ActivityError;

/// The code an activity reports when it finishes.
pub type OutcomeCode = String;

/// Executes a single activity.
///
/// Implementations own every side effect (network calls, computation).
/// The caller compares the returned code against `activity.expected_code`;
/// runners must not do that validation themselves.
#[async_trait]
pub trait ActivityRunner: Send + Sync {
  async fn run(&self, activity: &Activity) -> Result<OutcomeCode, ActivityError>;
}

#[async_trait]
impl<R: ActivityRunner + ?Sized> ActivityRunner for Arc<R> {
  async fn run(&self, activity: &Activity) -> Result<OutcomeCode, ActivityError> {
    (**self).run(activity).await
  }
}

#[async_trait]
impl<R: ActivityRunner + ?Sized> ActivityRunner for Box<R> {
  async fn run(&self, activity: &Activity) -> Result<OutcomeCode, ActivityError> {
    (**self).run(activity).await
  }
}
