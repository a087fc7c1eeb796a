//! Application configuration
//!
//! Values are layered: built-in defaults, then an optional `gremlin.toml`
//! (or an explicit file), then `GREMLIN_*` environment variables. Nested
//! keys use a double underscore, e.g. `GREMLIN_ELASTICSEARCH__URL`.

use std::path::Path;

use application::error::ApplicationError;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use domain::{DEFAULT_TRACKING_HEADER, TrackingHeader};
use integration_elasticsearch::ElasticsearchConfig;
use integration_proxy::{ControlPlaneConfig, ProxyConfig};
use serde::Deserialize;

use crate::telemetry::TelemetryConfig;

/// Header used to isolate one test's traffic
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackingConfig {
    /// Header name (default: X-Gremlin-ID)
    #[serde(default = "default_tracking_header")]
    pub header: String,

    /// Value pattern identifying this test's requests
    pub pattern: String,
}

fn default_tracking_header() -> String {
    DEFAULT_TRACKING_HEADER.to_string()
}

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Per-instance proxy API
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Control plane (optional); rules are batched through it when set
    #[serde(default)]
    pub control_plane: Option<ControlPlaneConfig>,

    /// Tracking header (optional; required with a control plane)
    #[serde(default)]
    pub tracking: Option<TrackingConfig>,

    /// Log store
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment and optional `gremlin` file
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or a value has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(
            config::Config::builder()
                .add_source(config::File::with_name("gremlin").required(false)),
        )
    }

    /// Load configuration from an explicit file, still overridable by environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(config::Config::builder().add_source(config::File::from(path.as_ref())))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                config::Environment::with_prefix("GREMLIN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// The configured tracking header
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the header or pattern is empty, or if
    /// a control plane is configured without tracking.
    pub fn tracking_header(&self) -> Result<Option<TrackingHeader>, ApplicationError> {
        let Some(tracking) = &self.tracking else {
            if self.control_plane.is_some() {
                return Err(ApplicationError::Configuration(
                    "control_plane requires a tracking pattern".to_string(),
                ));
            }
            return Ok(None);
        };
        TrackingHeader::new(&tracking.header, &tracking.pattern)
            .map(Some)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_sources() {
        let config = AppConfig::default();
        assert_eq!(config.proxy.scheme, "http");
        assert_eq!(config.elasticsearch.url, "http://localhost:9200");
        assert!(config.control_plane.is_none());
        assert!(config.tracking_header().unwrap().is_none());
    }

    #[test]
    fn loads_file_sections() {
        let file = write_config(
            r#"
            [proxy]
            timeout_secs = 3

            [elasticsearch]
            url = "http://es:9200"
            index = "gremlin-*"

            [control_plane]
            url = "http://a8:8080/v1/rules"
            token = "s3cret"

            [tracking]
            pattern = "test-42"

            [telemetry]
            json = true
            "#,
        );

        let config = AppConfig::load_from(file.path()).unwrap();

        assert_eq!(config.proxy.timeout_secs, 3);
        assert_eq!(config.proxy.scheme, "http");
        assert_eq!(config.elasticsearch.index, "gremlin-*");
        assert_eq!(config.elasticsearch.max_results, 10_000);
        let control_plane = config.control_plane.as_ref().unwrap();
        assert_eq!(control_plane.token.expose_secret(), "s3cret");
        assert_eq!(control_plane.timeout_secs, 30);
        assert!(config.telemetry.json);

        let tracking = config.tracking_header().unwrap().unwrap();
        assert_eq!(tracking.name(), "X-Gremlin-ID");
        assert_eq!(tracking.pattern(), "test-42");
    }

    #[test]
    fn control_plane_requires_tracking() {
        let file = write_config(
            r#"
            [control_plane]
            url = "http://a8:8080/v1/rules"
            token = "t"
            "#,
        );
        let config = AppConfig::load_from(file.path()).unwrap();
        let err = config.tracking_header().unwrap_err();
        assert!(matches!(err, ApplicationError::Configuration(_)));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let config = AppConfig {
            tracking: Some(TrackingConfig {
                header: "X-Test".to_string(),
                pattern: String::new(),
            }),
            ..Default::default()
        };
        assert!(config.tracking_header().is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::load_from("/nonexistent/gremlin.toml").is_err());
    }
}
