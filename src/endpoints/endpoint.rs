//! A single node endpoint.

use std::fmt;
use url::Url;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Network address of a node's REST gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Parse an endpoint URL. Only http and https are accepted.
    pub fn parse(raw: &str) -> BlockchainResult<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| BlockchainError::Config(format!("Invalid endpoint URL '{}': {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(Self { url }),
            other => Err(BlockchainError::Config(format!(
                "Unsupported endpoint scheme '{}' in '{}'",
                other, raw
            ))),
        }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Join an API path onto the endpoint, keeping any base path the endpoint carries.
    pub fn join(&self, path: &str) -> String {
        let base = self.url.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str().trim_end_matches('/'))
    }
}
