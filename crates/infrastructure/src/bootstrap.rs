//! Wiring of adapters into the application services

use std::sync::Arc;

use application::error::ApplicationError;
use application::{AssertionChecker, FailureGenerator};
use domain::Topology;
use tracing::info;

use crate::adapters::{ControlPlaneAdapter, ElasticsearchEventStore, GremlinProxyAdapter};
use crate::config::AppConfig;

/// Build a failure generator for `topology`
///
/// With a control plane configured, rules are pushed as one batch scoped to
/// the tracking header; otherwise each proxy instance is called directly.
///
/// # Errors
///
/// Returns an error if an HTTP client cannot be built or the tracking
/// configuration is invalid.
pub fn failure_generator(
    config: &AppConfig,
    topology: Topology,
) -> Result<FailureGenerator, ApplicationError> {
    let proxy = Arc::new(GremlinProxyAdapter::with_config(config.proxy.clone())?);
    let generator = FailureGenerator::new(topology, proxy);

    match (&config.control_plane, config.tracking_header()?) {
        (Some(control_plane), Some(tracking)) => {
            info!(url = %control_plane.url, tracking = %tracking, "Using control plane");
            let port = Arc::new(ControlPlaneAdapter::new(control_plane.clone())?);
            Ok(generator.with_control_plane(port, tracking))
        }
        _ => Ok(generator),
    }
}

/// Build an assertion checker reading the configured log store
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the tracking
/// configuration is invalid.
pub fn assertion_checker(
    config: &AppConfig,
    test_id: impl Into<String>,
) -> Result<AssertionChecker, ApplicationError> {
    let store = Arc::new(ElasticsearchEventStore::new(config.elasticsearch.clone())?);
    let checker = AssertionChecker::new(store, test_id);
    Ok(match config.tracking_header()? {
        Some(tracking) => checker.with_tracking(tracking),
        None => checker,
    })
}
