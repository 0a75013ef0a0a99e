use std::time::Duration;

use async_trait::async_trait;
use orca_workflow::Activity;
use tracing::info;

use crate::error::ActivityError;
use crate::runner::{ActivityRunner, OutcomeCode};

/// Development stand-in: waits a fixed delay, then reports the expected code.
#[derive(Debug, Clone)]
pub struct SimulatedRunner {
  delay: Duration,
}

impl SimulatedRunner {
  pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

  pub fn new(delay: Duration) -> Self {
    Self { delay }
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }
}

impl Default for SimulatedRunner {
  fn default() -> Self {
    Self::new(Self::DEFAULT_DELAY)
  }
}

#[async_trait]
impl ActivityRunner for SimulatedRunner {
  async fn run(&self, activity: &Activity) -> Result<OutcomeCode, ActivityError> {
    info!(
      activity_id = %activity.activity_id,
      script_ref = %activity.script_ref,
      expected_code = %activity.expected_code,
      "simulating activity"
    );

    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }

    Ok(activity.expected_code.clone())
  }
}
