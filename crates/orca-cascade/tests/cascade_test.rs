//! Integration tests for the cascade engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use orca_activity_runtime::{ActivityError, ActivityRunner, HandlerRunner, OutcomeCode};
use orca_cascade::{
  BlockStatus, CascadeEngine, CascadeEvent, CascadeNotifier, ChannelNotifier, EngineConfig,
  ExecutionTracker, InMemoryTracker,
};
use orca_loader::{Loader, StandardLoader, parse_definition};
use orca_workflow::{Activity, Block, BlockId, START_LABEL, Workflow};
use tokio_util::sync::CancellationToken;

/// What the test runner does for a given activity id.
#[derive(Clone)]
enum Behavior {
  Return(&'static str),
  Fail(&'static str),
  Sleep(Duration),
  Panic,
}

/// Runner double that counts calls and tracks how many activities overlap.
#[derive(Default)]
struct ScriptedRunner {
  behaviors: HashMap<String, Behavior>,
  delay: Duration,
  calls: Mutex<HashMap<String, usize>>,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl ScriptedRunner {
  fn new() -> Self {
    Self::default()
  }

  fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  fn on(mut self, activity_id: &str, behavior: Behavior) -> Self {
    self.behaviors.insert(activity_id.to_string(), behavior);
    self
  }

  fn calls(&self, activity_id: &str) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .get(activity_id)
      .copied()
      .unwrap_or(0)
  }

  fn total_calls(&self) -> usize {
    self.calls.lock().unwrap().values().sum()
  }

  fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ActivityRunner for ScriptedRunner {
  async fn run(&self, activity: &Activity) -> Result<OutcomeCode, ActivityError> {
    *self
      .calls
      .lock()
      .unwrap()
      .entry(activity.activity_id.clone())
      .or_default() += 1;

    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);

    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }

    let behavior = self.behaviors.get(&activity.activity_id).cloned();
    let result = match behavior {
      None => Ok(activity.expected_code.clone()),
      Some(Behavior::Return(code)) => Ok(code.to_string()),
      Some(Behavior::Fail(message)) => Err(ActivityError::failed(
        activity.activity_id.clone(),
        message,
      )),
      Some(Behavior::Sleep(duration)) => {
        tokio::time::sleep(duration).await;
        Ok(activity.expected_code.clone())
      }
      Some(Behavior::Panic) => panic!("activity {} exploded", activity.activity_id),
    };

    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    result
  }
}

fn block(id: usize, pre: &str, activity_id: &str, post: &str) -> Block {
  Block {
    block_id: BlockId(id),
    pre_requirement: pre.to_string(),
    activity: Activity {
      activity_id: activity_id.to_string(),
      script_ref: format!("{}.js", activity_id),
      expected_code: "OK".to_string(),
    },
    post_requirement: post.to_string(),
  }
}

fn workflow(blocks: Vec<Block>) -> Arc<Workflow> {
  Arc::new(Workflow::new("test-workflow", blocks).unwrap())
}

fn engine(runner: Arc<ScriptedRunner>) -> CascadeEngine {
  CascadeEngine::new(EngineConfig::default(), runner)
}

#[tokio::test]
async fn test_single_block_runs_once_and_cascades() {
  let runner = Arc::new(ScriptedRunner::new());
  let wf = workflow(vec![block(0, "START", "only", "ONLY_DONE")]);

  let report = engine(runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(runner.calls("only"), 1);
  assert_eq!(report.executed(), 1);
  assert_eq!(report.succeeded(), 1);
  assert_eq!(report.failed(), 0);
  assert!(report.quiescent);
  assert_eq!(
    report.outcome(BlockId(0)).unwrap().status,
    BlockStatus::Succeeded {
      code: "OK".to_string()
    }
  );
}

#[tokio::test]
async fn test_fan_out_dispatches_siblings_concurrently() {
  let runner = Arc::new(ScriptedRunner::new().with_delay(Duration::from_millis(50)));
  let wf = workflow(vec![
    block(0, "START", "left", "LEFT_DONE"),
    block(1, "START", "right", "RIGHT_DONE"),
  ]);

  let report = engine(runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(report.executed_blocks(), vec![BlockId(0), BlockId(1)]);
  assert_eq!(runner.max_in_flight(), 2);
}

#[tokio::test]
async fn test_mismatch_does_not_cascade() {
  let runner = Arc::new(ScriptedRunner::new().on("check", Behavior::Return("DENIED")));
  let wf = workflow(vec![
    block(0, "START", "check", "CHECKED"),
    block(1, "CHECKED", "after", "AFTER_DONE"),
  ]);

  let report = engine(runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(runner.calls("after"), 0);
  assert_eq!(report.executed(), 1);
  assert_eq!(
    report.outcome(BlockId(0)).unwrap().status,
    BlockStatus::Mismatch {
      expected: "OK".to_string(),
      actual: "DENIED".to_string(),
    }
  );
  assert!(report.quiescent);
}

#[tokio::test]
async fn test_unmatched_label_dispatches_nothing() {
  let runner = Arc::new(ScriptedRunner::new());
  let engine = engine(runner.clone());
  let run = engine.start(
    workflow(vec![block(0, "START", "a", "A")]),
    CancellationToken::new(),
  );

  run.cascade("NOBODY_WAITS_ON_THIS").await;

  assert_eq!(runner.total_calls(), 0);
  assert!(run.tracker().is_empty());
  assert_eq!(run.finish().executed(), 0);
}

#[tokio::test]
async fn test_retriggering_a_cycle_dispatches_nothing() {
  let runner = Arc::new(ScriptedRunner::new());
  let engine = engine(runner.clone());
  let run = engine.start(
    workflow(vec![
      block(0, "START", "enter", "X"),
      block(1, "X", "x_to_y", "Y"),
      block(2, "Y", "y_to_x", "X"),
    ]),
    CancellationToken::new(),
  );

  run.cascade(START_LABEL).await;
  assert_eq!(runner.total_calls(), 3);

  run.cascade("X").await;
  run.cascade("Y").await;

  assert_eq!(runner.calls("x_to_y"), 1);
  assert_eq!(runner.calls("y_to_x"), 1);
  assert_eq!(run.finish().executed(), 3);
}

#[tokio::test]
async fn test_shared_postcondition_runs_dependent_once() {
  let runner = Arc::new(ScriptedRunner::new().with_delay(Duration::from_millis(10)));
  let wf = workflow(vec![
    block(0, "START", "first", "DONE"),
    block(1, "START", "second", "DONE"),
    block(2, "DONE", "join", "JOINED"),
  ]);

  let report = engine(runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(runner.calls("join"), 1);
  assert_eq!(report.executed(), 3);
  assert_eq!(report.succeeded(), 3);
}

#[tokio::test]
async fn test_dependent_still_runs_through_other_producer() {
  let runner = Arc::new(ScriptedRunner::new().on("bad", Behavior::Return("NOPE")));
  let wf = workflow(vec![
    block(0, "START", "bad", "DONE"),
    block(1, "START", "good", "DONE"),
    block(2, "DONE", "next", "END"),
  ]);

  let report = engine(runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(runner.calls("next"), 1);
  assert_eq!(report.succeeded(), 2);
  assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn test_sibling_failure_is_isolated() {
  let runner = Arc::new(
    ScriptedRunner::new()
      .on("broken", Behavior::Fail("connection refused"))
      .on("crashing", Behavior::Panic),
  );
  let wf = workflow(vec![
    block(0, "START", "broken", "BROKEN_DONE"),
    block(1, "START", "crashing", "CRASH_DONE"),
    block(2, "START", "healthy", "HEALTHY_DONE"),
    block(3, "BROKEN_DONE", "after_broken", "X"),
    block(4, "CRASH_DONE", "after_crash", "Y"),
    block(5, "HEALTHY_DONE", "after_healthy", "Z"),
  ]);

  let report = engine(runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(runner.calls("after_broken"), 0);
  assert_eq!(runner.calls("after_crash"), 0);
  assert_eq!(runner.calls("after_healthy"), 1);

  assert!(matches!(
    &report.outcome(BlockId(0)).unwrap().status,
    BlockStatus::RunnerFailed { message } if message.contains("connection refused")
  ));
  assert!(matches!(
    &report.outcome(BlockId(1)).unwrap().status,
    BlockStatus::RunnerFailed { message } if message.contains("panicked")
  ));
  assert_eq!(report.executed(), 4);
  assert_eq!(report.succeeded(), 2);
  assert!(report.quiescent);
}

#[tokio::test]
async fn test_long_cycle_terminates_within_block_count() {
  let size = 25;
  let mut blocks = vec![block(0, "START", "entry", "L0")];
  for i in 1..size {
    let pre = format!("L{}", i - 1);
    let post = format!("L{}", i % (size - 1));
    blocks.push(block(i, &pre, &format!("step{}", i), &post));
  }
  let runner = Arc::new(ScriptedRunner::new());

  let report = engine(runner.clone())
    .execute(workflow(blocks), CancellationToken::new())
    .await;

  assert!(runner.total_calls() <= size);
  assert_eq!(report.executed(), runner.total_calls());
  assert!(report.quiescent);
}

#[tokio::test]
async fn test_no_start_block_is_a_noop() {
  let runner = Arc::new(ScriptedRunner::new());
  let wf = workflow(vec![block(0, "LATER", "a", "A")]);

  let report = engine(runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(report.executed(), 0);
  assert!(report.quiescent);
}

#[tokio::test]
async fn test_pre_claimed_block_is_skipped() {
  let runner = Arc::new(ScriptedRunner::new());
  let tracker = Arc::new(InMemoryTracker::new());
  assert!(tracker.try_claim(BlockId(1)));

  let engine = engine(runner.clone());
  let run = engine.start_with_tracker(
    workflow(vec![
      block(0, "START", "a", "A"),
      block(1, "START", "b", "B"),
    ]),
    tracker.clone(),
    CancellationToken::new(),
  );
  run.cascade(START_LABEL).await;

  assert_eq!(runner.calls("a"), 1);
  assert_eq!(runner.calls("b"), 0);
  assert_eq!(tracker.claimed(), vec![BlockId(0), BlockId(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_activity_timeout_is_runner_failure() {
  let runner = Arc::new(ScriptedRunner::new().on("slow", Behavior::Sleep(Duration::from_secs(10))));
  let config = EngineConfig {
    activity_timeout: Some(Duration::from_millis(50)),
    ..EngineConfig::default()
  };
  let wf = workflow(vec![
    block(0, "START", "slow", "SLOW_DONE"),
    block(1, "SLOW_DONE", "after", "END"),
  ]);

  let report = CascadeEngine::new(config, runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(runner.calls("after"), 0);
  assert!(matches!(
    &report.outcome(BlockId(0)).unwrap().status,
    BlockStatus::RunnerFailed { message } if message.contains("timed out after 50ms")
  ));
}

#[tokio::test]
async fn test_max_concurrency_bounds_in_flight_activities() {
  let runner = Arc::new(ScriptedRunner::new().with_delay(Duration::from_millis(10)));
  let config = EngineConfig {
    max_concurrency: Some(1),
    ..EngineConfig::default()
  };
  let wf = workflow(vec![
    block(0, "START", "a", "A"),
    block(1, "START", "b", "B"),
    block(2, "START", "c", "C"),
  ]);

  let report = CascadeEngine::new(config, runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(report.executed(), 3);
  assert_eq!(runner.max_in_flight(), 1);
}

#[tokio::test]
async fn test_cancelled_run_starts_nothing() {
  let runner = Arc::new(ScriptedRunner::new());
  let cancel = CancellationToken::new();
  cancel.cancel();

  let report = engine(runner.clone())
    .execute(workflow(vec![block(0, "START", "a", "A")]), cancel)
    .await;

  assert_eq!(runner.total_calls(), 0);
  assert!(!report.quiescent);
}

#[tokio::test]
async fn test_cancel_mid_run_stops_new_waves() {
  let cancel = CancellationToken::new();
  let trip = cancel.clone();
  let runner = HandlerRunner::new()
    .with_handler("first.js", move |_activity: Activity| {
      let trip = trip.clone();
      async move {
        trip.cancel();
        Ok::<_, ActivityError>("OK".to_string())
      }
    })
    .with_handler("second.js", |_activity: Activity| async {
      Ok::<_, ActivityError>("OK".to_string())
    });
  let wf = workflow(vec![
    block(0, "START", "first", "FIRST_DONE"),
    block(1, "FIRST_DONE", "second", "SECOND_DONE"),
  ]);

  let report = CascadeEngine::new(EngineConfig::default(), runner)
    .execute(wf, cancel)
    .await;

  assert_eq!(report.executed_blocks(), vec![BlockId(0)]);
  assert!(report.outcome(BlockId(0)).unwrap().status.is_success());
  assert!(!report.quiescent);
}

#[tokio::test]
async fn test_events_describe_the_run() {
  let runner = Arc::new(ScriptedRunner::new().on("b", Behavior::Return("BAD")));
  let (notifier, mut events) = ChannelNotifier::channel();
  let engine = CascadeEngine::with_notifier(EngineConfig::default(), runner, notifier);
  let wf = workflow(vec![
    block(0, "START", "a", "A"),
    block(1, "A", "b", "B"),
  ]);

  let report = engine.execute(wf, CancellationToken::new()).await;

  let mut received = Vec::new();
  while let Ok(event) = events.try_recv() {
    received.push(event);
  }

  assert_eq!(
    received.first(),
    Some(&CascadeEvent::RunStarted {
      run_id: report.run_id.clone(),
      workflow: "test-workflow".to_string(),
    })
  );
  assert_eq!(
    received.last(),
    Some(&CascadeEvent::RunCompleted {
      run_id: report.run_id.clone(),
      executed: 2,
      succeeded: 1,
      failed: 1,
      quiescent: true,
    })
  );
  assert!(received.contains(&CascadeEvent::WaveStarted {
    run_id: report.run_id.clone(),
    label: "START".to_string(),
    block_ids: vec![BlockId(0)],
  }));
  assert!(received.contains(&CascadeEvent::LabelSatisfied {
    run_id: report.run_id.clone(),
    label: "A".to_string(),
    block_id: BlockId(0),
  }));
  assert!(received.contains(&CascadeEvent::BlockMismatch {
    run_id: report.run_id.clone(),
    block_id: BlockId(1),
    activity_id: "b".to_string(),
    expected: "OK".to_string(),
    actual: "BAD".to_string(),
  }));
  assert!(!received.iter().any(|e| matches!(
    e,
    CascadeEvent::LabelSatisfied { label, .. } if label == "B"
  )));
}

/// Notifier that panics while reporting the success of one activity, so the
/// dispatch task dies before it records the block's outcome.
struct PanickingNotifier {
  activity_id: &'static str,
}

impl CascadeNotifier for PanickingNotifier {
  fn notify(&self, event: CascadeEvent) {
    if let CascadeEvent::BlockSucceeded { activity_id, .. } = &event {
      if activity_id == self.activity_id {
        panic!("notifier failed for {}", activity_id);
      }
    }
  }
}

#[tokio::test]
async fn test_dispatch_task_death_is_recorded_as_runner_failure() {
  let runner = Arc::new(ScriptedRunner::new());
  let engine = CascadeEngine::with_notifier(
    EngineConfig::default(),
    runner.clone(),
    PanickingNotifier { activity_id: "bad" },
  );
  let wf = workflow(vec![
    block(0, "START", "bad", "BAD_DONE"),
    block(1, "START", "good", "GOOD_DONE"),
    block(2, "BAD_DONE", "after-bad", "X"),
    block(3, "GOOD_DONE", "after-good", "Y"),
  ]);

  let report = engine.execute(wf, CancellationToken::new()).await;

  match &report.outcome(BlockId(0)).unwrap().status {
    BlockStatus::RunnerFailed { message } => assert!(message.contains("panicked")),
    other => panic!("expected runner failure, got {other:?}"),
  }
  assert!(report.outcome(BlockId(1)).unwrap().status.is_success());
  assert!(report.outcome(BlockId(3)).unwrap().status.is_success());
  assert!(report.outcome(BlockId(2)).is_none());
  assert_eq!(runner.calls("after-bad"), 0);
  assert_eq!(report.executed_blocks(), vec![BlockId(0), BlockId(1), BlockId(3)]);
  assert!(report.quiescent);
}

#[tokio::test]
async fn test_loaded_definition_runs_end_to_end() {
  let def = parse_definition(
    r#"{
      "workflow": "orders",
      "blocks": [
        { "preRequirement": "START",
          "activity": { "activityId": "validate", "scriptRef": "validate.js", "expectedCode": "VALID" },
          "postRequirement": "VALIDATED" },
        { "preRequirement": "VALIDATED",
          "activity": { "activityId": "charge", "scriptRef": "charge.js", "expectedCode": "PAID" },
          "postRequirement": "PAID" },
        { "preRequirement": "VALIDATED",
          "activity": { "activityId": "reserve", "scriptRef": "reserve.js", "expectedCode": "RESERVED" },
          "postRequirement": "RESERVED" }
      ]
    }"#,
  )
  .unwrap();
  let wf = Arc::new(StandardLoader::new().load(def).await.unwrap());
  let runner = Arc::new(ScriptedRunner::new());

  let report = engine(runner.clone())
    .execute(wf, CancellationToken::new())
    .await;

  assert_eq!(report.workflow, "orders");
  assert_eq!(report.succeeded(), 3);
  assert_eq!(runner.calls("charge"), 1);
  assert_eq!(runner.calls("reserve"), 1);
}
