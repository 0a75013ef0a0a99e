//! A single cascade run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::BoxFuture;
use orca_activity_runtime::{ActivityError, ActivityRunner, OutcomeCode};
use orca_workflow::{Activity, Block, BlockId, Label, Workflow};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::{CascadeEvent, CascadeNotifier, NoopNotifier};
use crate::report::{BlockOutcome, BlockStatus, RunReport};
use crate::tracker::ExecutionTracker;

/// State shared by every branch of one run.
pub(crate) struct RunState<N> {
  pub(crate) run_id: String,
  pub(crate) workflow: Arc<Workflow>,
  pub(crate) tracker: Arc<dyn ExecutionTracker>,
  pub(crate) runner: Arc<dyn ActivityRunner>,
  pub(crate) notifier: Arc<N>,
  pub(crate) permits: Option<Arc<Semaphore>>,
  pub(crate) activity_timeout: Option<Duration>,
  pub(crate) cancel: CancellationToken,
  pub(crate) outcomes: Mutex<Vec<BlockOutcome>>,
  pub(crate) interrupted: AtomicBool,
  pub(crate) started: Instant,
}

/// A handle to a cascade run.
///
/// Created by [`CascadeEngine::start`](crate::CascadeEngine::start). The
/// tracker lives as long as the handle, so calling [`cascade`](Self::cascade)
/// again with a label whose blocks already ran dispatches nothing.
pub struct CascadeRun<N: CascadeNotifier + 'static = NoopNotifier> {
  state: Arc<RunState<N>>,
}

impl<N: CascadeNotifier + 'static> CascadeRun<N> {
  pub(crate) fn new(state: RunState<N>) -> Self {
    let run = Self {
      state: Arc::new(state),
    };

    info!(
      run_id = %run.state.run_id,
      workflow = %run.state.workflow.name(),
      blocks = run.state.workflow.blocks().len(),
      "run_started"
    );
    run.state.notifier.notify(CascadeEvent::RunStarted {
      run_id: run.state.run_id.clone(),
      workflow: run.state.workflow.name().to_string(),
    });

    run
  }

  pub fn run_id(&self) -> &str {
    &self.state.run_id
  }

  pub fn workflow(&self) -> &Workflow {
    &self.state.workflow
  }

  pub fn tracker(&self) -> &Arc<dyn ExecutionTracker> {
    &self.state.tracker
  }

  /// Mark `label` satisfied and run everything it unlocks.
  ///
  /// Returns once every block in the resulting subtree has finished.
  pub async fn cascade(&self, label: impl Into<Label>) {
    cascade(self.state.clone(), label.into()).await
  }

  /// Snapshot of the outcomes recorded so far.
  pub fn report(&self) -> RunReport {
    let mut outcomes = self
      .state
      .outcomes
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .clone();
    outcomes.sort_by_key(|o| o.block_id);

    RunReport {
      run_id: self.state.run_id.clone(),
      workflow: self.state.workflow.name().to_string(),
      outcomes,
      quiescent: !self.state.interrupted.load(Ordering::SeqCst),
      elapsed_ms: millis(self.state.started.elapsed()),
    }
  }

  /// Close the run and produce its report.
  pub fn finish(self) -> RunReport {
    let report = self.report();

    info!(
      run_id = %report.run_id,
      executed = report.executed(),
      succeeded = report.succeeded(),
      failed = report.failed(),
      quiescent = report.quiescent,
      elapsed_ms = report.elapsed_ms,
      "run_completed"
    );
    self.state.notifier.notify(CascadeEvent::RunCompleted {
      run_id: report.run_id.clone(),
      executed: report.executed(),
      succeeded: report.succeeded(),
      failed: report.failed(),
      quiescent: report.quiescent,
    });

    report
  }
}

/// One cascade step: select, dispatch concurrently, join.
///
/// Boxed because each dispatched block recurses into the next step.
fn cascade<N: CascadeNotifier + 'static>(state: Arc<RunState<N>>, label: Label) -> BoxFuture<'static, ()> {
  async move {
    if state.cancel.is_cancelled() {
      state.interrupted.store(true, Ordering::SeqCst);
      warn!(run_id = %state.run_id, label = %label, "run cancelled; label not cascaded");
      return;
    }

    let selected: Vec<Block> = state
      .workflow
      .blocks_gated_on(&label)
      .filter(|block| state.claim(block))
      .cloned()
      .collect();

    if selected.is_empty() {
      debug!(run_id = %state.run_id, label = %label, "no eligible blocks");
      return;
    }

    let block_ids: Vec<BlockId> = selected.iter().map(|b| b.block_id).collect();
    info!(
      run_id = %state.run_id,
      label = %label,
      blocks = ?block_ids,
      "wave_started"
    );
    state.notifier.notify(CascadeEvent::WaveStarted {
      run_id: state.run_id.clone(),
      label: label.clone(),
      block_ids: block_ids.clone(),
    });

    let handles: Vec<_> = selected
      .into_iter()
      .map(|block| tokio::spawn(dispatch(state.clone(), block)))
      .collect();

    let results = futures::future::join_all(handles).await;

    for (block_id, result) in block_ids.into_iter().zip(results) {
      if let Err(e) = result {
        error!(
          run_id = %state.run_id,
          block_id = %block_id,
          error = %e,
          "block task aborted"
        );
        state.record_abort(block_id, e.to_string());
      }
    }
  }
  .boxed()
}

/// Run one claimed block, validate it, and cascade its postcondition on success.
async fn dispatch<N: CascadeNotifier + 'static>(state: Arc<RunState<N>>, block: Block) {
  let started = Instant::now();
  let result = state.invoke(&block.activity).await;
  let elapsed_ms = millis(started.elapsed());

  let status = match result {
    Ok(code) if block.activity.accepts(&code) => {
      info!(
        run_id = %state.run_id,
        block_id = %block.block_id,
        activity_id = %block.activity.activity_id,
        code = %code,
        elapsed_ms,
        "block_succeeded"
      );
      state.notifier.notify(CascadeEvent::BlockSucceeded {
        run_id: state.run_id.clone(),
        block_id: block.block_id,
        activity_id: block.activity.activity_id.clone(),
        code: code.clone(),
      });
      BlockStatus::Succeeded { code }
    }
    Ok(actual) => {
      warn!(
        run_id = %state.run_id,
        block_id = %block.block_id,
        activity_id = %block.activity.activity_id,
        expected = %block.activity.expected_code,
        actual = %actual,
        "block_mismatch"
      );
      state.notifier.notify(CascadeEvent::BlockMismatch {
        run_id: state.run_id.clone(),
        block_id: block.block_id,
        activity_id: block.activity.activity_id.clone(),
        expected: block.activity.expected_code.clone(),
        actual: actual.clone(),
      });
      BlockStatus::Mismatch {
        expected: block.activity.expected_code.clone(),
        actual,
      }
    }
    Err(e) => {
      error!(
        run_id = %state.run_id,
        block_id = %block.block_id,
        activity_id = %block.activity.activity_id,
        error = %e,
        "block_failed"
      );
      state.notifier.notify(CascadeEvent::BlockFailed {
        run_id: state.run_id.clone(),
        block_id: block.block_id,
        activity_id: block.activity.activity_id.clone(),
        error: e.to_string(),
      });
      BlockStatus::RunnerFailed {
        message: e.to_string(),
      }
    }
  };

  let succeeded = status.is_success();
  state.record(BlockOutcome {
    block_id: block.block_id,
    activity_id: block.activity.activity_id.clone(),
    pre_requirement: block.pre_requirement.clone(),
    post_requirement: block.post_requirement.clone(),
    status,
    elapsed_ms,
  });

  if succeeded {
    info!(
      run_id = %state.run_id,
      block_id = %block.block_id,
      label = %block.post_requirement,
      "label_satisfied"
    );
    state.notifier.notify(CascadeEvent::LabelSatisfied {
      run_id: state.run_id.clone(),
      label: block.post_requirement.clone(),
      block_id: block.block_id,
    });
    cascade(state, block.post_requirement).await;
  }
}

impl<N: CascadeNotifier> RunState<N> {
  fn claim(&self, block: &Block) -> bool {
    if !self.tracker.try_claim(block.block_id) {
      debug!(
        run_id = %self.run_id,
        block_id = %block.block_id,
        "block already claimed; skipping"
      );
      return false;
    }

    debug!(
      run_id = %self.run_id,
      block_id = %block.block_id,
      activity_id = %block.activity.activity_id,
      "block_claimed"
    );
    self.notifier.notify(CascadeEvent::BlockClaimed {
      run_id: self.run_id.clone(),
      block_id: block.block_id,
      activity_id: block.activity.activity_id.clone(),
    });
    true
  }

  /// Invoke the runner in its own task so a panic or timeout stays local to the block.
  async fn invoke(&self, activity: &Activity) -> Result<OutcomeCode, ActivityError> {
    let _permit = match &self.permits {
      Some(permits) => Some(permits.clone().acquire_owned().await.map_err(|_| {
        ActivityError::failed(activity.activity_id.clone(), "concurrency limiter closed")
      })?),
      None => None,
    };

    let runner = self.runner.clone();
    let owned = activity.clone();
    let mut handle = tokio::spawn(async move { runner.run(&owned).await });

    let joined = match self.activity_timeout {
      Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
        Ok(joined) => joined,
        Err(_) => {
          handle.abort();
          return Err(ActivityError::Timeout {
            activity_id: activity.activity_id.clone(),
            timeout_ms: millis(limit),
          });
        }
      },
      None => handle.await,
    };

    joined.map_err(|e| {
      ActivityError::failed(
        activity.activity_id.clone(),
        format!("activity task panicked: {}", e),
      )
    })?
  }

  fn record(&self, outcome: BlockOutcome) {
    self
      .outcomes
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .push(outcome);
  }

  /// Record a block whose dispatch task died before it could record itself.
  fn record_abort(&self, block_id: BlockId, message: String) {
    let mut outcomes = self.outcomes.lock().unwrap_or_else(|e| e.into_inner());
    if outcomes.iter().any(|o| o.block_id == block_id) {
      return;
    }
    if let Some(block) = self.workflow.get_block(block_id) {
      outcomes.push(BlockOutcome {
        block_id,
        activity_id: block.activity.activity_id.clone(),
        pre_requirement: block.pre_requirement.clone(),
        post_requirement: block.post_requirement.clone(),
        status: BlockStatus::RunnerFailed { message },
        elapsed_ms: 0,
      });
    }
  }
}

fn millis(duration: Duration) -> u64 {
  u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
