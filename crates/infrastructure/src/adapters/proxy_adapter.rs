//! Proxy adapter - Implements ProxyControlPort using integration_proxy

use application::error::ApplicationError;
use application::ports::ProxyControlPort;
use async_trait::async_trait;
use domain::{FaultRule, TestId};
use integration_proxy::{GremlinProxyClient, ProxyClient, ProxyConfig, ProxyError, RulePayload};
use serde_json::Value;
use tracing::instrument;

/// Talks to each proxy instance's management API
#[derive(Debug)]
pub struct GremlinProxyAdapter {
    client: GremlinProxyClient,
}

impl GremlinProxyAdapter {
    /// Create an adapter with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn new() -> Result<Self, ApplicationError> {
        Self::with_config(ProxyConfig::default())
    }

    /// Create with custom configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn with_config(config: ProxyConfig) -> Result<Self, ApplicationError> {
        let client = GremlinProxyClient::new(config).map_err(map_error)?;
        Ok(Self { client })
    }
}

/// Map proxy client errors to application errors
pub(crate) fn map_error(err: ProxyError) -> ApplicationError {
    match err {
        ProxyError::InvalidRule(e) => ApplicationError::Internal(e),
        other => ApplicationError::Transport(other.to_string()),
    }
}

#[async_trait]
impl ProxyControlPort for GremlinProxyAdapter {
    #[instrument(skip(self, rule))]
    async fn add_rule(&self, instance: &str, rule: &FaultRule) -> Result<(), ApplicationError> {
        self.client
            .add_rule(instance, &RulePayload::from(rule))
            .await
            .map_err(map_error)
    }

    #[instrument(skip(self))]
    async fn clear_rules(&self, instance: &str) -> Result<(), ApplicationError> {
        self.client.clear_rules(instance).await.map_err(map_error)
    }

    #[instrument(skip(self))]
    async fn list_rules(&self, instance: &str) -> Result<Value, ApplicationError> {
        self.client.list_rules(instance).await.map_err(map_error)
    }

    #[instrument(skip(self), fields(test_id = %test_id))]
    async fn start_test(&self, instance: &str, test_id: &TestId) -> Result<(), ApplicationError> {
        self.client
            .start_test(instance, test_id.as_str())
            .await
            .map_err(map_error)
    }
}
