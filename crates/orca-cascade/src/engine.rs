//! The cascade engine.
//!
//! Given a workflow, the engine satisfies the start label and keeps
//! dispatching blocks as their preconditions become satisfied, until no
//! unclaimed block is gated on any newly satisfied label.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use orca_activity_runtime::ActivityRunner;
use orca_workflow::{START_LABEL, Workflow};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::events::{CascadeNotifier, NoopNotifier};
use crate::report::RunReport;
use crate::run::{CascadeRun, RunState};
use crate::tracker::{ExecutionTracker, InMemoryTracker};

/// Configuration for the cascade engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
  /// Upper bound on activities running at once, across all runs of this engine.
  /// `None` means unbounded.
  pub max_concurrency: Option<usize>,
  /// Activities running longer than this are reported as runner failures.
  pub activity_timeout: Option<Duration>,
}

/// The cascade engine.
///
/// Generic over `N: CascadeNotifier` to allow different notification strategies.
/// Use `CascadeEngine::new()` for an engine with no-op notifications,
/// or `CascadeEngine::with_notifier()` to observe events.
pub struct CascadeEngine<N: CascadeNotifier + 'static = NoopNotifier> {
  config: EngineConfig,
  runner: Arc<dyn ActivityRunner>,
  notifier: Arc<N>,
  permits: Option<Arc<Semaphore>>,
}

impl CascadeEngine<NoopNotifier> {
  /// Create an engine with no-op notifications.
  pub fn new(config: EngineConfig, runner: impl ActivityRunner + 'static) -> Self {
    Self::with_notifier(config, runner, NoopNotifier)
  }
}

impl<N: CascadeNotifier + 'static> CascadeEngine<N> {
  /// Create an engine with a custom notifier.
  pub fn with_notifier(
    config: EngineConfig,
    runner: impl ActivityRunner + 'static,
    notifier: N,
  ) -> Self {
    let permits = config
      .max_concurrency
      .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

    Self {
      config,
      runner: Arc::new(runner),
      notifier: Arc::new(notifier),
      permits,
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Run `workflow` from the start label until the cascade settles.
  ///
  /// Block failures never fail the run; they show up in the report.
  #[instrument(
    name = "cascade_run",
    skip(self, workflow, cancel),
    fields(workflow = %workflow.name())
  )]
  pub async fn execute(&self, workflow: Arc<Workflow>, cancel: CancellationToken) -> RunReport {
    let run = self.start(workflow, cancel);
    run.cascade(START_LABEL).await;
    run.finish()
  }

  /// Open a run with a fresh tracker without cascading anything yet.
  pub fn start(&self, workflow: Arc<Workflow>, cancel: CancellationToken) -> CascadeRun<N> {
    self.start_with_tracker(workflow, Arc::new(InMemoryTracker::new()), cancel)
  }

  /// Open a run that claims blocks through `tracker`.
  pub fn start_with_tracker(
    &self,
    workflow: Arc<Workflow>,
    tracker: Arc<dyn ExecutionTracker>,
    cancel: CancellationToken,
  ) -> CascadeRun<N> {
    CascadeRun::new(RunState {
      run_id: uuid::Uuid::new_v4().to_string(),
      workflow,
      tracker,
      runner: self.runner.clone(),
      notifier: self.notifier.clone(),
      permits: self.permits.clone(),
      activity_timeout: self.config.activity_timeout,
      cancel,
      outcomes: Mutex::new(Vec::new()),
      interrupted: AtomicBool::new(false),
      started: Instant::now(),
    })
  }
}
