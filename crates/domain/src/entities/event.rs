//! Event entity - One logged request or response observed by a proxy

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action name a proxy records when it aborted a request
pub const ABORT_ACTION: &str = "abort";

/// Whether an event records a request or a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Request,
    Response,
}

impl EventKind {
    /// Value of the `msg` field in access logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Response => "Response",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field events are bucketed by when counting attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    /// Request id assigned by the calling service
    #[default]
    RequestId,
    /// Request URI
    Uri,
    /// Value of the test tracking header
    TrackingValue,
}

/// Immutable record of one message crossing the edge `source -> dest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub test_id: String,
    pub source: String,
    pub dest: String,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    /// HTTP status, responses only
    pub status: Option<u16>,
    /// Observed latency, responses only
    pub duration: Option<Duration>,
    /// Actions the proxy performed, requests only
    pub actions: Vec<String>,
    pub uri: Option<String>,
    /// Value of the tracking header, if the proxy logged it
    pub tracking_value: Option<String>,
}

impl Event {
    fn new(
        kind: EventKind,
        source: impl Into<String>,
        dest: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            test_id: String::new(),
            source: source.into(),
            dest: dest.into(),
            kind,
            timestamp,
            request_id: String::new(),
            status: None,
            duration: None,
            actions: Vec::new(),
            uri: None,
            tracking_value: None,
        }
    }

    /// Request event
    pub fn request(
        source: impl Into<String>,
        dest: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(EventKind::Request, source, dest, timestamp)
    }

    /// Response event carrying an HTTP status
    pub fn response(
        source: impl Into<String>,
        dest: impl Into<String>,
        timestamp: DateTime<Utc>,
        status: u16,
    ) -> Self {
        let mut event = Self::new(EventKind::Response, source, dest, timestamp);
        event.status = Some(status);
        event
    }

    #[must_use]
    pub fn with_test_id(mut self, test_id: impl Into<String>) -> Self {
        self.test_id = test_id.into();
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn with_tracking_value(mut self, value: impl Into<String>) -> Self {
        self.tracking_value = Some(value.into());
        self
    }

    pub const fn is_request(&self) -> bool {
        matches!(self.kind, EventKind::Request)
    }

    pub const fn is_response(&self) -> bool {
        matches!(self.kind, EventKind::Response)
    }

    /// Request the proxy aborted on purpose
    pub fn is_injected_abort(&self) -> bool {
        self.is_request() && self.actions.iter().any(|a| a == ABORT_ACTION)
    }

    /// Response with status 200
    pub fn is_success(&self) -> bool {
        self.is_response() && self.status == Some(200)
    }

    /// Non-200 response or injected abort
    pub fn is_failure(&self) -> bool {
        (self.is_response() && self.status != Some(200)) || self.is_injected_abort()
    }

    /// Value of the grouping field, `None` if the event does not carry it
    pub fn group_value(&self, key: GroupKey) -> Option<&str> {
        match key {
            GroupKey::RequestId => {
                (!self.request_id.is_empty()).then_some(self.request_id.as_str())
            }
            GroupKey::Uri => self.uri.as_deref(),
            GroupKey::TrackingValue => self.tracking_value.as_deref(),
        }
    }
}
