use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of sending one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
  /// One-based row number.
  pub row: usize,
  /// Status reported by the endpoint, or `failed`.
  pub status: String,
  pub server: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl DispatchResult {
  pub const FAILED: &'static str = "failed";

  pub fn is_failed(&self) -> bool {
    self.error.is_some()
  }
}

/// Outcome of a whole dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
  /// Per-row results in row order.
  pub results: Vec<DispatchResult>,
  /// Wall time, e.g. `0m 1.25s`.
  pub duration: String,
}

impl DispatchReport {
  pub fn failed(&self) -> usize {
    self.results.iter().filter(|r| r.is_failed()).count()
  }
}

/// Format a duration as whole minutes plus seconds with two decimals.
pub fn format_duration(duration: Duration) -> String {
  let millis = duration.as_millis();
  let minutes = millis / 60_000;
  let seconds = (millis % 60_000) as f64 / 1000.0;
  format!("{}m {:.2}s", minutes, seconds)
}
