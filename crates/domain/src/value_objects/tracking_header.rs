//! Tracking header value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Default header used to tag test traffic
pub const DEFAULT_TRACKING_HEADER: &str = "X-Gremlin-ID";

/// HTTP header name plus a value pattern that isolates one test's traffic
///
/// Concurrent tests may share the same proxies and the same telemetry
/// stream. Each one tags its requests with a header value matching its own
/// pattern, and both rule installation and log queries filter on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingHeader {
    name: String,
    pattern: String,
}

impl TrackingHeader {
    /// Create a tracking header
    ///
    /// # Errors
    ///
    /// Returns an error if either the name or the pattern is empty.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let pattern = pattern.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidScenario(
                "tracking header name must not be empty".to_string(),
            ));
        }
        if pattern.trim().is_empty() {
            return Err(DomainError::InvalidScenario(
                "tracking header pattern must not be empty".to_string(),
            ));
        }
        Ok(Self { name, pattern })
    }

    /// Tracking on the default `X-Gremlin-ID` header
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is empty.
    pub fn with_default_name(pattern: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(DEFAULT_TRACKING_HEADER, pattern)
    }

    /// Header name as sent on the wire
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Field name under which access logs record this header
    ///
    /// Log shippers store request headers as `http_<name>` with the name
    /// lower-cased and dashes turned into underscores.
    ///
    /// ```
    /// use domain::TrackingHeader;
    ///
    /// let header = TrackingHeader::new("X-Gremlin-ID", "test-1").unwrap();
    /// assert_eq!(header.log_field(), "http_x_gremlin_id");
    /// ```
    pub fn log_field(&self) -> String {
        format!("http_{}", self.name.to_lowercase().replace('-', "_"))
    }
}

impl fmt::Display for TrackingHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.pattern)
    }
}
