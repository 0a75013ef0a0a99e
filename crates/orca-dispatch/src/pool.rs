use url::Url;

use crate::error::DispatchError;

/// A fixed, ordered set of endpoints addressed round-robin.
#[derive(Debug, Clone)]
pub struct EndpointPool {
  endpoints: Vec<Url>,
}

impl EndpointPool {
  /// Parse and validate endpoint URLs. Order is preserved.
  pub fn new<I, S>(endpoints: I) -> Result<Self, DispatchError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let endpoints = endpoints
      .into_iter()
      .map(|endpoint| {
        let endpoint = endpoint.as_ref();
        Url::parse(endpoint).map_err(|source| DispatchError::InvalidEndpoint {
          endpoint: endpoint.to_string(),
          source,
        })
      })
      .collect::<Result<Vec<_>, _>>()?;

    if endpoints.is_empty() {
      return Err(DispatchError::EmptyPool);
    }
    Ok(Self { endpoints })
  }

  pub fn len(&self) -> usize {
    self.endpoints.len()
  }

  pub fn is_empty(&self) -> bool {
    self.endpoints.is_empty()
  }

  /// Endpoint that receives the row at `index`.
  pub fn endpoint_for(&self, index: usize) -> &Url {
    &self.endpoints[index % self.endpoints.len()]
  }

  /// One-based display name of the endpoint that receives the row at `index`.
  pub fn server_name(&self, index: usize) -> String {
    format!("server-{}", index % self.endpoints.len() + 1)
  }
}
