//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports on top of the proxy and log store
//! clients, and provides configuration loading and tracing setup.

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod telemetry;

pub use adapters::*;
pub use bootstrap::{assertion_checker, failure_generator};
pub use crate::config::{AppConfig, TrackingConfig};
pub use telemetry::{TelemetryConfig, TelemetryError, init_tracing};
