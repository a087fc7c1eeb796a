//! Fault-injection proxy integration
//!
//! HTTP clients for the two ways rules reach the proxies: the management API
//! every proxy instance exposes, and a control plane that installs one batch
//! of rules for all proxies at once.

pub mod client;
pub mod control_plane;
mod error;
mod models;

pub use client::{GremlinProxyClient, ProxyClient, ProxyConfig};
pub use control_plane::{ControlPlaneClient, ControlPlaneConfig};
pub use error::ProxyError;
pub use models::{ControlPlaneRule, RuleFilters, RulePayload, RuleUpdate};
