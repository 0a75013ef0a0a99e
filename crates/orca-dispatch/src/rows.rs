use std::path::Path;

use serde_json::{Map, Value};

use crate::error::DispatchError;

/// Read rows from a file. See [`parse_rows`] for the accepted formats.
/// At most `limit` rows are kept.
pub async fn load_rows(path: &Path, limit: Option<usize>) -> Result<Vec<Value>, DispatchError> {
  let content = tokio::fs::read_to_string(path)
    .await
    .map_err(|source| DispatchError::Io {
      path: path.to_path_buf(),
      source,
    })?;
  parse_rows(&content, limit)
}

/// Parse rows from CSV with a header row, a JSON array of objects, or one
/// JSON object per line.
pub fn parse_rows(content: &str, limit: Option<usize>) -> Result<Vec<Value>, DispatchError> {
  let trimmed = content.trim_start();
  let limit = limit.unwrap_or(usize::MAX);

  let rows: Vec<Value> = if trimmed.starts_with('[') {
    serde_json::from_str(trimmed)?
  } else if trimmed.starts_with('{') {
    trimmed
      .lines()
      .filter(|line| !line.trim().is_empty())
      .take(limit)
      .map(|line| serde_json::from_str(line))
      .collect::<Result<_, _>>()?
  } else {
    return parse_csv_rows(trimmed, limit);
  };

  if let Some(row) = rows.iter().position(|r| !r.is_object()) {
    return Err(DispatchError::NotAnObject { row: row + 1 });
  }

  Ok(rows.into_iter().take(limit).collect())
}

/// Header names become keys. Reading stops once `limit` rows are in.
fn parse_csv_rows(content: &str, limit: usize) -> Result<Vec<Value>, DispatchError> {
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(content.as_bytes());

  reader
    .deserialize::<Map<String, Value>>()
    .take(limit)
    .map(|record| record.map(Value::Object).map_err(DispatchError::from))
    .collect()
}
