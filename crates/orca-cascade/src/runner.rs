//! Workflow runner with channel-based triggering.
//!
//! The `WorkflowRunner` owns an mpsc channel of run requests and executes each
//! one with the cascade engine. Every run gets its own tracker, so queued runs
//! of the same workflow never see each other's claims.

use std::sync::Arc;

use orca_workflow::Workflow;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::engine::CascadeEngine;
use crate::error::CascadeError;
use crate::events::CascadeNotifier;
use crate::report::RunReport;

/// A request to run a workflow once.
#[derive(Debug)]
pub struct RunRequest {
  pub workflow: Arc<Workflow>,
  /// Where to deliver the report, if anyone is waiting for it.
  pub reply: Option<oneshot::Sender<RunReport>>,
}

/// Executes workflows in response to queued run requests.
///
/// # Usage
///
/// ```ignore
/// let runner = WorkflowRunner::new(engine);
///
/// // Get sender for external triggers
/// let sender = runner.sender();
///
/// // Start the execution loop
/// let cancel = CancellationToken::new();
/// runner.start(cancel).await;
/// ```
pub struct WorkflowRunner<N: CascadeNotifier + 'static> {
  sender: mpsc::Sender<RunRequest>,
  receiver: mpsc::Receiver<RunRequest>,
  engine: Arc<CascadeEngine<N>>,
}

impl<N: CascadeNotifier + 'static> WorkflowRunner<N> {
  pub fn new(engine: Arc<CascadeEngine<N>>) -> Self {
    Self::with_buffer_size(engine, 100)
  }

  pub fn with_buffer_size(engine: Arc<CascadeEngine<N>>, buffer_size: usize) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size);
    Self {
      sender,
      receiver,
      engine,
    }
  }

  /// Get a sender handle for queueing runs.
  pub fn sender(&self) -> mpsc::Sender<RunRequest> {
    self.sender.clone()
  }

  /// Start the execution loop.
  ///
  /// Runs until the cancellation token is triggered or every sender is dropped.
  /// Each run receives a child token, so cancelling the loop also stops the
  /// run in progress from starting new waves.
  pub async fn start(mut self, cancel: CancellationToken) {
    info!("starting workflow runner");
    // Drop our own sender so the loop ends once external senders are gone.
    drop(self.sender);

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("workflow runner cancelled");
          break;
        }
        request = self.receiver.recv() => {
          let Some(request) = request else {
            info!("workflow runner channel closed");
            break;
          };

          let report = self
            .engine
            .execute(request.workflow, cancel.child_token())
            .await;

          info!(
            run_id = %report.run_id,
            workflow = %report.workflow,
            executed = report.executed(),
            failed = report.failed(),
            "queued run finished"
          );

          if let Some(reply) = request.reply {
            // Caller may have stopped waiting
            let _ = reply.send(report);
          }
        }
      }
    }
  }

  pub fn engine(&self) -> &CascadeEngine<N> {
    &self.engine
  }
}

/// Queue a run on a [`WorkflowRunner`] and wait for its report.
///
/// The runner loop must be running on another task; `sender` comes from
/// [`WorkflowRunner::sender`] taken before the runner was started.
pub async fn submit(
  sender: &mpsc::Sender<RunRequest>,
  workflow: Arc<Workflow>,
) -> Result<RunReport, CascadeError> {
  let (reply, response) = oneshot::channel();
  sender
    .send(RunRequest {
      workflow,
      reply: Some(reply),
    })
    .await
    .map_err(|_| CascadeError::ChannelClosed)?;
  response.await.map_err(|_| CascadeError::RunDropped)
}
