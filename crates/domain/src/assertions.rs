//! Assertions - Typed behavioral properties checked against logged events
//!
//! Assertions usually come from checklist documents where parameters are a
//! loose JSON object:
//!
//! ```json
//! { "checks": [
//!     { "name": "bounded_response_time", "source": "gateway",
//!       "dest": "productpage", "max_latency": "100ms" }
//! ] }
//! ```
//!
//! [`Assertion::from_params`] turns one such entry into a typed variant and
//! fails fast on missing or unusable parameters.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DomainError;
use crate::value_objects::parse_duration;

/// Diagnostic used when a query matched no events
pub const NO_LOG_ENTRIES: &str = "No log entries found";

/// Default spacing tolerance for `bounded_retries`
pub const DEFAULT_ERROR_TOLERANCE: Duration = Duration::from_millis(10);

/// Older parameter spellings still accepted in checklists
const ALIASES: &[(&str, &str)] = &[
    ("request_id", "req_id"),
    ("error_tolerance", "errdelta"),
    ("closed_attempts", "max_attempts"),
    ("half_open_attempts", "sthreshold"),
];

/// A property with its typed parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    /// Every response for the request on `source -> dest` carries `status`
    HttpStatus {
        source: String,
        dest: String,
        request_id: String,
        status: u16,
    },
    /// Every response of the test carries status 200
    HttpSuccessStatus,
    /// The proxies logged no errors of their own
    NoProxyErrors,
    /// Every response on `source -> dest` took at most `max_latency`
    BoundedResponseTime {
        source: String,
        dest: String,
        max_latency: Duration,
    },
    /// No request group on `source -> dest` has more than `num_requests + 1` attempts
    AtMostRequests {
        source: String,
        dest: String,
        num_requests: u32,
    },
    /// Retries on `source -> dest` are bounded and, optionally, evenly spaced
    BoundedRetries {
        source: String,
        dest: String,
        retries: u32,
        wait_time: Option<Duration>,
        error_tolerance: Duration,
        by_uri: bool,
    },
    /// `source` runs a correct circuit breaker in front of `dest`
    CircuitBreaker {
        source: String,
        dest: String,
        closed_attempts: u32,
        reset_time: Duration,
        half_open_attempts: u32,
    },
}

impl Assertion {
    /// Property name as used in checklists
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HttpStatus { .. } => "http_status",
            Self::HttpSuccessStatus => "http_success_status",
            Self::NoProxyErrors => "no_proxy_errors",
            Self::BoundedResponseTime { .. } => "bounded_response_time",
            Self::AtMostRequests { .. } => "at_most_requests",
            Self::BoundedRetries { .. } => "bounded_retries",
            Self::CircuitBreaker { .. } => "circuit_breaker",
        }
    }

    /// Build a typed assertion from a property name and loose parameters
    ///
    /// Durations are accepted as duration strings (`"1s500ms"`) or as
    /// numbers of seconds.
    ///
    /// # Errors
    ///
    /// - [`DomainError::UnknownAssertion`] for an unknown name
    /// - [`DomainError::MissingParameter`] if a required parameter is absent
    /// - [`DomainError::InvalidParameter`] if a parameter has the wrong shape
    pub fn from_params(name: &str, params: &Map<String, Value>) -> Result<Self, DomainError> {
        let p = Params {
            assertion: name,
            map: params,
        };
        match name {
            "http_status" => Ok(Self::HttpStatus {
                source: p.text("source")?,
                dest: p.text("dest")?,
                request_id: p.text("request_id")?,
                status: p.status("status")?,
            }),
            "http_success_status" => Ok(Self::HttpSuccessStatus),
            "no_proxy_errors" => Ok(Self::NoProxyErrors),
            "bounded_response_time" => Ok(Self::BoundedResponseTime {
                source: p.text("source")?,
                dest: p.text("dest")?,
                max_latency: p.duration("max_latency")?,
            }),
            "at_most_requests" => Ok(Self::AtMostRequests {
                source: p.text("source")?,
                dest: p.text("dest")?,
                num_requests: p.count("num_requests")?,
            }),
            "bounded_retries" => Ok(Self::BoundedRetries {
                source: p.text("source")?,
                dest: p.text("dest")?,
                retries: p.count("retries")?,
                wait_time: p.optional_duration("wait_time")?,
                error_tolerance: p
                    .optional_duration("error_tolerance")?
                    .unwrap_or(DEFAULT_ERROR_TOLERANCE),
                by_uri: p.flag("by_uri")?,
            }),
            "circuit_breaker" => Ok(Self::CircuitBreaker {
                source: p.text("source")?,
                dest: p.text("dest")?,
                closed_attempts: p.count("closed_attempts")?,
                reset_time: p.duration("reset_time")?,
                half_open_attempts: p.optional_count("half_open_attempts")?.unwrap_or(1),
            }),
            other => Err(DomainError::UnknownAssertion(other.to_string())),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::HttpStatus {
                source,
                dest,
                request_id,
                status,
            } => vec![
                ("source", source.clone()),
                ("dest", dest.clone()),
                ("request_id", request_id.clone()),
                ("status", status.to_string()),
            ],
            Self::HttpSuccessStatus | Self::NoProxyErrors => Vec::new(),
            Self::BoundedResponseTime {
                source,
                dest,
                max_latency,
            } => vec![
                ("source", source.clone()),
                ("dest", dest.clone()),
                ("max_latency", format!("{max_latency:?}")),
            ],
            Self::AtMostRequests {
                source,
                dest,
                num_requests,
            } => vec![
                ("source", source.clone()),
                ("dest", dest.clone()),
                ("num_requests", num_requests.to_string()),
            ],
            Self::BoundedRetries {
                source,
                dest,
                retries,
                wait_time,
                error_tolerance,
                by_uri,
            } => {
                let mut params = vec![
                    ("source", source.clone()),
                    ("dest", dest.clone()),
                    ("retries", retries.to_string()),
                ];
                if let Some(wait) = wait_time {
                    params.push(("wait_time", format!("{wait:?}")));
                    params.push(("error_tolerance", format!("{error_tolerance:?}")));
                }
                if *by_uri {
                    params.push(("by_uri", "true".to_string()));
                }
                params
            }
            Self::CircuitBreaker {
                source,
                dest,
                closed_attempts,
                reset_time,
                half_open_attempts,
            } => vec![
                ("source", source.clone()),
                ("dest", dest.clone()),
                ("closed_attempts", closed_attempts.to_string()),
                ("reset_time", format!("{reset_time:?}")),
                ("half_open_attempts", half_open_attempts.to_string()),
            ],
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .params()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        write!(f, "{}({})", self.name(), rendered.join(", "))
    }
}

/// Typed access to loose checklist parameters
struct Params<'a> {
    assertion: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    fn find(&self, key: &str) -> Option<&'a Value> {
        let alias = ALIASES
            .iter()
            .find(|(canonical, _)| *canonical == key)
            .map(|(_, alias)| *alias);
        self.map
            .get(key)
            .or_else(|| alias.and_then(|a| self.map.get(a)))
            .filter(|v| !v.is_null())
    }

    fn missing(&self, key: &str) -> DomainError {
        DomainError::missing_parameter(self.assertion, key)
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> DomainError {
        DomainError::invalid_parameter(self.assertion, key, reason)
    }

    fn text(&self, key: &str) -> Result<String, DomainError> {
        match self.find(key) {
            Some(Value::String(s)) if s.trim().is_empty() => Err(self.invalid(key, "must not be empty")),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(self.invalid(key, "expected a string")),
            None => Err(self.missing(key)),
        }
    }

    fn optional_count(&self, key: &str) -> Result<Option<u32>, DomainError> {
        self.find(key)
            .map(|value| {
                value
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| self.invalid(key, "expected a non-negative integer"))
            })
            .transpose()
    }

    fn count(&self, key: &str) -> Result<u32, DomainError> {
        self.optional_count(key)?.ok_or_else(|| self.missing(key))
    }

    fn status(&self, key: &str) -> Result<u16, DomainError> {
        let value = self.find(key).ok_or_else(|| self.missing(key))?;
        let number = match value {
            Value::String(s) => s.trim().parse::<u64>().ok(),
            other => other.as_u64(),
        };
        number
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| self.invalid(key, "expected an HTTP status code"))
    }

    fn optional_duration(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let Some(value) = self.find(key) else {
            return Ok(None);
        };
        match value {
            Value::String(s) => parse_duration(s).map(Some),
            Value::Number(n) => n
                .as_f64()
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected a non-negative number of seconds")),
            _ => Err(self.invalid(key, "expected a duration string or seconds")),
        }
    }

    fn duration(&self, key: &str) -> Result<Duration, DomainError> {
        self.optional_duration(key)?.ok_or_else(|| self.missing(key))
    }

    fn flag(&self, key: &str) -> Result<bool, DomainError> {
        match self.find(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.invalid(key, "expected a boolean")),
        }
    }
}

/// One entry of a checklist: a property name plus loose parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub name: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Checklist document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub checks: Vec<CheckSpec>,
}

/// Pass/fail verdict of one property plus its diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    violations: Vec<String>,
}

impl CheckOutcome {
    pub const fn pass() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            violations: vec![message.into()],
        }
    }

    /// Failure because the log store had nothing to check
    pub fn no_evidence() -> Self {
        Self::fail(NO_LOG_ENTRIES)
    }

    pub fn record(&mut self, message: impl Into<String>) {
        self.violations.push(message.into());
    }

    pub fn is_success(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// All diagnostics joined into one line, empty on success
    pub fn message(&self) -> String {
        self.violations.join("; ")
    }

    pub fn into_result(self, name: impl Into<String>, info: impl Into<String>) -> AssertionResult {
        AssertionResult {
            name: name.into(),
            info: info.into(),
            success: self.is_success(),
            error_message: self.message(),
        }
    }
}

/// Reported result of one assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub name: String,
    /// Rendered parameters
    pub info: String,
    pub success: bool,
    pub error_message: String,
}
