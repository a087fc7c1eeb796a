//! Fault-injection proxy port
//!
//! Defines the per-instance interface of the proxies that enforce fault
//! rules on the wire. Every call targets one proxy instance, addressed as
//! `host:port`.

use async_trait::async_trait;
use domain::{FaultRule, TestId};
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::error::ApplicationError;

/// Port for per-instance proxy control
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProxyControlPort: Send + Sync {
    /// Install one rule on a proxy instance
    async fn add_rule(&self, instance: &str, rule: &FaultRule) -> Result<(), ApplicationError>;

    /// Remove every rule installed on a proxy instance
    async fn clear_rules(&self, instance: &str) -> Result<(), ApplicationError>;

    /// Fetch the rules installed on a proxy instance
    async fn list_rules(&self, instance: &str) -> Result<Value, ApplicationError>;

    /// Tell a proxy instance which test its log entries belong to
    async fn start_test(&self, instance: &str, test_id: &TestId) -> Result<(), ApplicationError>;
}
