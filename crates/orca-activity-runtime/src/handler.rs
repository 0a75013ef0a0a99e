use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use orca_workflow::Activity;
use tracing::debug;

use crate::error::ActivityError;
use crate::runner::{ActivityRunner, OutcomeCode};

/// In-process logic bound to a script reference.
#[async_trait]
pub trait ActivityHandler: Send + Sync {
  async fn handle(&self, activity: &Activity) -> Result<OutcomeCode, ActivityError>;
}

#[async_trait]
impl<F, Fut> ActivityHandler for F
where
  F: Fn(Activity) -> Fut + Send + Sync,
  Fut: Future<Output = Result<OutcomeCode, ActivityError>> + Send + 'static,
{
  async fn handle(&self, activity: &Activity) -> Result<OutcomeCode, ActivityError> {
    (self)(activity.clone()).await
  }
}

/// Runner that resolves `script_ref` against registered handlers.
///
/// This is how a host plugs real executors in without dynamic code loading:
/// each script reference maps to one handler.
#[derive(Clone, Default)]
pub struct HandlerRunner {
  handlers: HashMap<String, Arc<dyn ActivityHandler>>,
}

impl HandlerRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a handler, replacing any previous one for the same reference.
  pub fn register(
    &mut self,
    script_ref: impl Into<String>,
    handler: impl ActivityHandler + 'static,
  ) -> &mut Self {
    self.handlers.insert(script_ref.into(), Arc::new(handler));
    self
  }

  /// Builder form of [`register`](Self::register).
  pub fn with_handler(
    mut self,
    script_ref: impl Into<String>,
    handler: impl ActivityHandler + 'static,
  ) -> Self {
    self.register(script_ref, handler);
    self
  }

  pub fn contains(&self, script_ref: &str) -> bool {
    self.handlers.contains_key(script_ref)
  }
}

#[async_trait]
impl ActivityRunner for HandlerRunner {
  async fn run(&self, activity: &Activity) -> Result<OutcomeCode, ActivityError> {
    let handler = self
      .handlers
      .get(&activity.script_ref)
      .ok_or_else(|| ActivityError::UnknownScript {
        activity_id: activity.activity_id.clone(),
        script_ref: activity.script_ref.clone(),
      })?;

    debug!(
      activity_id = %activity.activity_id,
      script_ref = %activity.script_ref,
      "dispatching to handler"
    );
    handler.handle(activity).await
  }
}
