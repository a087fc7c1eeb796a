//! Control plane adapter - Implements ControlPlanePort using integration_proxy

use application::error::ApplicationError;
use application::ports::ControlPlanePort;
use async_trait::async_trait;
use domain::{FaultRule, TrackingHeader};
use integration_proxy::{ControlPlaneClient, ControlPlaneConfig, ControlPlaneRule, RuleUpdate};
use tracing::{info, instrument};

use super::proxy_adapter::map_error;

/// Installs rule batches through a control plane
#[derive(Debug)]
pub struct ControlPlaneAdapter {
    client: ControlPlaneClient,
}

impl ControlPlaneAdapter {
    /// Create an adapter for the given control plane
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn new(config: ControlPlaneConfig) -> Result<Self, ApplicationError> {
        let client = ControlPlaneClient::new(config).map_err(map_error)?;
        Ok(Self { client })
    }

    fn build_update(
        tracking: &TrackingHeader,
        rules: &[FaultRule],
    ) -> Result<RuleUpdate, ApplicationError> {
        let converted = rules
            .iter()
            .map(|rule| ControlPlaneRule::from_rule(rule, tracking))
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_error)?;
        Ok(RuleUpdate::new(tracking, converted))
    }
}

#[async_trait]
impl ControlPlanePort for ControlPlaneAdapter {
    #[instrument(skip(self, rules), fields(tracking = %tracking, rules = rules.len()))]
    async fn replace_rules(
        &self,
        tracking: &TrackingHeader,
        rules: &[FaultRule],
    ) -> Result<(), ApplicationError> {
        let update = Self::build_update(tracking, rules)?;
        self.client.put_rules(&update).await.map_err(map_error)?;
        info!("Installed rules through control plane");
        Ok(())
    }

    #[instrument(skip(self), fields(tracking = %tracking))]
    async fn clear_rules(&self, tracking: &TrackingHeader) -> Result<(), ApplicationError> {
        self.client
            .put_rules(&RuleUpdate::new(tracking, Vec::new()))
            .await
            .map_err(map_error)
    }
}
