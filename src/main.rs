use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orca_activity_runtime::SimulatedRunner;
use orca_cascade::{CascadeEngine, EngineConfig};
use orca_dispatch::{Dispatcher, EndpointPool, HttpTransport, Strategy, load_rows};
use orca_loader::{Loader, StandardLoader, read_definition};

/// Orca - a requirement-driven workflow orchestrator
#[derive(Parser)]
#[command(name = "orca")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow from its START label until it settles
  Run {
    /// Path to the workflow definition (JSON)
    workflow_file: PathBuf,

    /// Simulated activity latency in milliseconds
    #[arg(long, env = "ORCA_DELAY_MS", default_value_t = 500)]
    delay_ms: u64,

    /// Upper bound on activities running at once
    #[arg(long, env = "ORCA_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Fail activities that run longer than this many milliseconds
    #[arg(long, env = "ORCA_ACTIVITY_TIMEOUT_MS")]
    activity_timeout_ms: Option<u64>,
  },

  /// Load a workflow and print its label graph
  Validate {
    /// Path to the workflow definition (JSON)
    workflow_file: PathBuf,
  },

  /// Send rows round-robin to a pool of endpoints
  Dispatch {
    /// CSV file with a header row, or a JSON array / JSON-lines file of objects
    rows_file: PathBuf,

    /// Endpoint URL; repeat for each member of the pool
    #[arg(long = "endpoint", required = true)]
    endpoints: Vec<String>,

    #[arg(long, value_enum, default_value_t = StrategyArg::Wide)]
    strategy: StrategyArg,

    /// Rows per batch for the wide strategy
    #[arg(long, env = "ORCA_BATCH_SIZE", default_value_t = Strategy::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Only send the first N rows
    #[arg(long, env = "ORCA_LIMIT")]
    limit: Option<usize>,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
  Wide,
  Narrow,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let rt = tokio::runtime::Runtime::new()?;

  match cli.command {
    Commands::Run {
      workflow_file,
      delay_ms,
      max_concurrency,
      activity_timeout_ms,
    } => {
      let config = EngineConfig {
        max_concurrency,
        activity_timeout: activity_timeout_ms.map(Duration::from_millis),
      };
      rt.block_on(run_workflow(&workflow_file, Duration::from_millis(delay_ms), config))
    }
    Commands::Validate { workflow_file } => rt.block_on(validate_workflow(&workflow_file)),
    Commands::Dispatch {
      rows_file,
      endpoints,
      strategy,
      batch_size,
      limit,
    } => {
      let strategy = match strategy {
        StrategyArg::Wide => Strategy::Wide { batch_size },
        StrategyArg::Narrow => Strategy::Narrow,
      };
      rt.block_on(dispatch_rows(&rows_file, endpoints, strategy, limit))
    }
  }
}

async fn run_workflow(workflow_file: &Path, delay: Duration, config: EngineConfig) -> Result<()> {
  let workflow = load_workflow(workflow_file).await?;

  let engine = CascadeEngine::new(config, SimulatedRunner::new(delay));

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("interrupt received, no new waves will start");
      on_interrupt.cancel();
    }
  });

  let report = engine.execute(Arc::new(workflow), cancel).await;

  info!(
    executed = report.executed(),
    succeeded = report.succeeded(),
    failed = report.failed(),
    "run finished"
  );
  println!("{}", serde_json::to_string_pretty(&report)?);

  Ok(())
}

async fn validate_workflow(workflow_file: &Path) -> Result<()> {
  let workflow = load_workflow(workflow_file).await?;
  let graph = workflow.graph();

  let summary = serde_json::json!({
    "workflow": workflow.name(),
    "blocks": workflow.blocks().len(),
    "entryPoints": graph.entry_points(),
    "terminalLabels": graph.terminal_labels(),
    "unsatisfiableLabels": graph.unsatisfiable_labels(),
  });
  println!("{}", serde_json::to_string_pretty(&summary)?);

  Ok(())
}

async fn dispatch_rows(
  rows_file: &Path,
  endpoints: Vec<String>,
  strategy: Strategy,
  limit: Option<usize>,
) -> Result<()> {
  let pool = EndpointPool::new(&endpoints).context("invalid endpoint pool")?;
  let rows = load_rows(rows_file, limit)
    .await
    .with_context(|| format!("failed to load rows: {}", rows_file.display()))?;
  if rows.is_empty() {
    bail!("no rows found in {}", rows_file.display());
  }

  info!(rows = rows.len(), endpoints = pool.len(), ?strategy, "dispatching");

  let dispatcher = Dispatcher::new(pool, HttpTransport::default(), strategy);
  let report = dispatcher.process_all(&rows).await;

  println!("{}", serde_json::to_string_pretty(&report)?);

  Ok(())
}

async fn load_workflow(workflow_file: &Path) -> Result<orca_workflow::Workflow> {
  let def = read_definition(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  StandardLoader::new()
    .load(def)
    .await
    .with_context(|| format!("invalid workflow: {}", workflow_file.display()))
}
