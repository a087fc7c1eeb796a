//! Control plane client
//!
//! A control plane owns the rules of every proxy it manages. Rules are
//! replaced as one batch scoped to a tracking header, so several tests can
//! share the proxies as long as their header patterns differ.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::ProxyError;
use crate::models::RuleUpdate;

/// Control plane configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ControlPlaneConfig {
    /// Rules endpoint of the control plane
    pub url: String,

    /// Bearer token (sensitive)
    pub token: SecretString,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

const fn default_timeout() -> u64 {
    30
}

impl ControlPlaneConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: SecretString::from(token.into()),
            timeout_secs: default_timeout(),
        }
    }
}

/// HTTP client for the control plane rules API
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    client: Client,
    config: ControlPlaneConfig,
}

impl ControlPlaneClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: ControlPlaneConfig) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProxyError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Replace every rule of the update's tracking header
    ///
    /// An update without rules removes them.
    #[instrument(skip(self, update), fields(header = %update.req_tracking_header, rules = update.filters.rules.len()))]
    pub async fn put_rules(&self, update: &RuleUpdate) -> Result<(), ProxyError> {
        debug!(url = %self.config.url, "Replacing control plane rules");

        let response = self
            .client
            .put(&self.config.url)
            .bearer_auth(self.config.token.expose_secret())
            .json(update)
            .send()
            .await
            .map_err(|e| ProxyError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = %status, "Control plane rejected token");
            return Err(ProxyError::Unauthorized(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(ProxyError::RequestFailed {
                url: self.config.url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
