//! Gremlin proxy management client
//!
//! Every proxy instance exposes a small management API under `/gremlin/v1`.
//! Instances are addressed as `host:port`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::ProxyError;
use crate::models::RulePayload;

/// Proxy management API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// URL scheme used to reach instances (default: http)
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_scheme() -> String {
    "http".to_string()
}

const fn default_timeout() -> u64 {
    10
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Management operations of a single proxy instance
#[async_trait]
pub trait ProxyClient: Send + Sync {
    /// Install one rule
    async fn add_rule(&self, instance: &str, rule: &RulePayload) -> Result<(), ProxyError>;

    /// Remove every installed rule
    async fn clear_rules(&self, instance: &str) -> Result<(), ProxyError>;

    /// Rules currently installed
    async fn list_rules(&self, instance: &str) -> Result<Value, ProxyError>;

    /// Tag subsequent log entries with a test id
    async fn start_test(&self, instance: &str, test_id: &str) -> Result<(), ProxyError>;
}

/// HTTP client for the proxy management API
#[derive(Debug, Clone)]
pub struct GremlinProxyClient {
    client: Client,
    config: ProxyConfig,
}

impl GremlinProxyClient {
    /// Create a new client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProxyError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a new client with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_defaults() -> Result<Self, ProxyError> {
        Self::new(ProxyConfig::default())
    }

    fn url(&self, instance: &str, path: &str) -> String {
        format!("{}://{}/gremlin/v1{}", self.config.scheme, instance, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<Response, ProxyError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProxyError::ConnectionFailed(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::RequestFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ProxyClient for GremlinProxyClient {
    #[instrument(skip(self, rule), fields(source = %rule.source, dest = %rule.dest))]
    async fn add_rule(&self, instance: &str, rule: &RulePayload) -> Result<(), ProxyError> {
        let url = self.url(instance, "/rules/add");
        debug!(url = %url, "Adding rule");
        self.send(self.client.post(&url).json(rule), &url).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_rules(&self, instance: &str) -> Result<(), ProxyError> {
        let url = self.url(instance, "/rules");
        debug!(url = %url, "Clearing rules");
        self.send(self.client.delete(&url), &url).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_rules(&self, instance: &str) -> Result<Value, ProxyError> {
        let url = self.url(instance, "/rules/list");
        debug!(url = %url, "Listing rules");
        let response = self.send(self.client.get(&url), &url).await?;
        response
            .json()
            .await
            .map_err(|e| ProxyError::ParseError(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn start_test(&self, instance: &str, test_id: &str) -> Result<(), ProxyError> {
        let url = self.url(instance, &format!("/test/{test_id}"));
        debug!(url = %url, "Starting test");
        self.send(self.client.put(&url), &url).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.scheme, "http");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn config_fills_missing_fields() {
        let config: ProxyConfig = serde_json::from_str(r#"{"timeout_secs": 3}"#).unwrap();
        assert_eq!(config.scheme, "http");
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn urls_are_built_per_instance() {
        let client = GremlinProxyClient::with_defaults().unwrap();
        assert_eq!(
            client.url("10.0.0.5:9876", "/rules/add"),
            "http://10.0.0.5:9876/gremlin/v1/rules/add"
        );
    }
}
