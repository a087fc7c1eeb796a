//! Control plane port
//!
//! Some deployments manage every proxy through one control plane instead of
//! talking to each instance. Rules are then replaced as a whole batch,
//! scoped to the traffic carrying a tracking header.

use async_trait::async_trait;
use domain::{FaultRule, TrackingHeader};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for batched rule management through a control plane
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ControlPlanePort: Send + Sync {
    /// Replace all rules for traffic matching `tracking` with `rules`
    async fn replace_rules(
        &self,
        tracking: &TrackingHeader,
        rules: &[FaultRule],
    ) -> Result<(), ApplicationError>;

    /// Remove all rules for traffic matching `tracking`
    async fn clear_rules(&self, tracking: &TrackingHeader) -> Result<(), ApplicationError>;
}
