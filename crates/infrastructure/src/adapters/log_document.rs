//! Mapping of proxy log documents to events
//!
//! Proxies of different generations log slightly different shapes: the
//! timestamp is either an RFC 3339 `ts` or a numeric `timestamp_in_ms`,
//! statuses may be numbers or strings, `actions` a string or a list, and
//! durations Go-style strings or plain seconds.

use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::{Event, EventKind, parse_duration};
use serde_json::Value;

/// Log field names
pub mod fields {
    pub const MESSAGE: &str = "msg";
    pub const SOURCE: &str = "source";
    pub const DEST: &str = "dest";
    pub const TEST_ID: &str = "testid";
    pub const REQUEST_ID: &str = "reqID";
    pub const TIMESTAMP: &str = "ts";
    pub const TIMESTAMP_MS: &str = "timestamp_in_ms";
    pub const STATUS: &str = "status";
    pub const DURATION: &str = "duration";
    pub const ACTIONS: &str = "actions";
    pub const URI: &str = "uri";
    pub const LEVEL: &str = "level";
}

/// Why a document was not turned into an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    /// `msg` is neither `Request` nor `Response`
    NotAnEvent,
    MissingField(&'static str),
    BadTimestamp(String),
}

/// Convert one `_source` document
///
/// `tracking_field` names the field holding the tracking header value.
pub fn to_event(doc: &Value, tracking_field: Option<&str>) -> Result<Event, Skipped> {
    let kind = match text(doc, fields::MESSAGE).as_deref() {
        Some("Request") => EventKind::Request,
        Some("Response") => EventKind::Response,
        _ => return Err(Skipped::NotAnEvent),
    };
    let source = text(doc, fields::SOURCE).ok_or(Skipped::MissingField(fields::SOURCE))?;
    let dest = text(doc, fields::DEST).ok_or(Skipped::MissingField(fields::DEST))?;
    let timestamp = timestamp(doc)?;

    let mut event = Event::request(source, dest, timestamp);
    if kind == EventKind::Response {
        event.kind = kind;
        event.status = status(doc);
    }
    if let Some(test_id) = text(doc, fields::TEST_ID) {
        event = event.with_test_id(test_id);
    }
    if let Some(request_id) = text(doc, fields::REQUEST_ID) {
        event = event.with_request_id(request_id);
    }
    if let Some(duration) = doc.get(fields::DURATION).and_then(duration) {
        event = event.with_duration(duration);
    }
    for action in actions(doc) {
        event = event.with_action(action);
    }
    if let Some(uri) = text(doc, fields::URI) {
        event = event.with_uri(uri);
    }
    if let Some(value) = tracking_field.and_then(|field| text(doc, field)) {
        event = event.with_tracking_value(value);
    }
    Ok(event)
}

/// Non-empty string or number rendered as text
fn text(doc: &Value, field: &str) -> Option<String> {
    match doc.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn timestamp(doc: &Value) -> Result<DateTime<Utc>, Skipped> {
    if let Some(ts) = doc.get(fields::TIMESTAMP).and_then(Value::as_str) {
        return DateTime::parse_from_rfc3339(ts)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Skipped::BadTimestamp(format!("{ts}: {e}")));
    }
    let millis = match doc.get(fields::TIMESTAMP_MS) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or(Skipped::MissingField(fields::TIMESTAMP))?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Skipped::BadTimestamp(millis.to_string()))
}

fn status(doc: &Value) -> Option<u16> {
    match doc.get(fields::STATUS)? {
        Value::Number(n) => n.as_u64().and_then(|s| u16::try_from(s).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Duration string, or seconds as number or numeric string
fn duration(value: &Value) -> Option<Duration> {
    match value {
        Value::Number(n) => n.as_f64().and_then(seconds),
        Value::String(s) => parse_duration(s)
            .ok()
            .or_else(|| s.trim().parse().ok().and_then(seconds)),
        _ => None,
    }
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

fn actions(doc: &Value) -> Vec<String> {
    match doc.get(fields::ACTIONS) {
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(ToString::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
