use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::TransportError;

/// Sends one row to one endpoint and returns the status it reports.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, endpoint: &Url, payload: &serde_json::Value) -> Result<String, TransportError>;
}

/// Posts rows as JSON and reads `status` from the JSON response.
///
/// Non-2xx responses are errors.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
  client: reqwest::Client,
}

#[derive(Deserialize)]
struct StatusBody {
  status: String,
}

impl HttpTransport {
  pub fn new(client: reqwest::Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn send(&self, endpoint: &Url, payload: &serde_json::Value) -> Result<String, TransportError> {
    let body: StatusBody = self
      .client
      .post(endpoint.clone())
      .json(payload)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;
    Ok(body.status)
  }
}
