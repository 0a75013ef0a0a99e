use std::time::Instant;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::pool::EndpointPool;
use crate::report::{DispatchReport, DispatchResult, format_duration};
use crate::transport::Transport;

/// How many rows are in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Every batch and every row in it are sent concurrently.
  Wide { batch_size: usize },
  /// One row per endpoint at a time; chunks run one after another.
  Narrow,
}

impl Strategy {
  pub const DEFAULT_BATCH_SIZE: usize = 50;

  pub fn wide() -> Self {
    Strategy::Wide {
      batch_size: Self::DEFAULT_BATCH_SIZE,
    }
  }
}

impl Default for Strategy {
  fn default() -> Self {
    Self::wide()
  }
}

/// Sends rows to an endpoint pool with a given strategy.
pub struct Dispatcher<T> {
  pool: EndpointPool,
  transport: T,
  strategy: Strategy,
}

impl<T: Transport> Dispatcher<T> {
  pub fn new(pool: EndpointPool, transport: T, strategy: Strategy) -> Self {
    Self {
      pool,
      transport,
      strategy,
    }
  }

  pub fn pool(&self) -> &EndpointPool {
    &self.pool
  }

  pub fn transport(&self) -> &T {
    &self.transport
  }

  pub fn strategy(&self) -> Strategy {
    self.strategy
  }

  /// Send every row and collect one result per row, in row order.
  ///
  /// Transport failures are recorded on the row and never abort the rest.
  #[instrument(skip(self, rows), fields(rows = rows.len(), endpoints = self.pool.len()))]
  pub async fn process_all(&self, rows: &[Value]) -> DispatchReport {
    let started = Instant::now();

    let results = match self.strategy {
      Strategy::Wide { batch_size } => self.process_wide(rows, batch_size.max(1)).await,
      Strategy::Narrow => self.process_narrow(rows).await,
    };

    let report = DispatchReport {
      results,
      duration: format_duration(started.elapsed()),
    };
    info!(
      rows = rows.len(),
      failed = report.failed(),
      duration = %report.duration,
      "dispatch finished"
    );
    report
  }

  async fn process_wide(&self, rows: &[Value], batch_size: usize) -> Vec<DispatchResult> {
    let batches = rows.chunks(batch_size).enumerate().map(|(batch, chunk)| {
      let offset = batch * batch_size;
      debug!(batch, size = chunk.len(), "sending batch");
      join_all(
        chunk
          .iter()
          .enumerate()
          .map(move |(i, row)| self.send_one(offset + i, row)),
      )
    });

    join_all(batches).await.into_iter().flatten().collect()
  }

  async fn process_narrow(&self, rows: &[Value]) -> Vec<DispatchResult> {
    let width = self.pool.len();
    let mut results = Vec::with_capacity(rows.len());

    for (chunk_index, chunk) in rows.chunks(width).enumerate() {
      let offset = chunk_index * width;
      debug!(chunk = chunk_index, size = chunk.len(), "sending chunk");
      let sent = join_all(
        chunk
          .iter()
          .enumerate()
          .map(|(i, row)| self.send_one(offset + i, row)),
      )
      .await;
      results.extend(sent);
    }

    results
  }

  async fn send_one(&self, index: usize, row: &Value) -> DispatchResult {
    let endpoint = self.pool.endpoint_for(index);
    let server = self.pool.server_name(index);

    match self.transport.send(endpoint, row).await {
      Ok(status) => DispatchResult {
        row: index + 1,
        status,
        server,
        error: None,
      },
      Err(e) => {
        warn!(row = index + 1, server = %server, error = %e, "row failed");
        DispatchResult {
          row: index + 1,
          status: DispatchResult::FAILED.to_string(),
          server,
          error: Some(e.to_string()),
        }
      }
    }
  }
}
