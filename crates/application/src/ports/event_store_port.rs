//! Event store port
//!
//! Defines the interface for querying the request/response events the
//! proxies logged during a test run.

use std::collections::HashMap;

use async_trait::async_trait;
use domain::{Event, EventKind, GroupKey, TrackingHeader};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Filter for an event query
///
/// Every set field must match. An empty `kinds` list matches both requests
/// and responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub test_id: Option<String>,
    pub source: Option<String>,
    pub dest: Option<String>,
    pub kinds: Vec<EventKind>,
    pub request_id: Option<String>,
    /// Only events whose tracking header value starts with the pattern
    pub tracking: Option<TrackingHeader>,
    /// Ask the store for per-group counts
    pub group_by: Option<GroupKey>,
}

impl EventQuery {
    /// Query scoped to one test run
    pub fn for_test(test_id: impl Into<String>) -> Self {
        Self {
            test_id: Some(test_id.into()),
            ..Self::default()
        }
    }

    /// Restrict to the edge `source -> dest`
    #[must_use]
    pub fn on_edge(mut self, source: impl Into<String>, dest: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.dest = Some(dest.into());
        self
    }

    #[must_use]
    pub fn of_kind(mut self, kind: EventKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_tracking(mut self, tracking: Option<TrackingHeader>) -> Self {
        self.tracking = tracking;
        self
    }

    #[must_use]
    pub const fn grouped_by(mut self, key: GroupKey) -> Self {
        self.group_by = Some(key);
        self
    }
}

/// Number of events sharing one group key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub key: String,
    pub count: u64,
}

/// Result of an event query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSet {
    /// Total number of matching events as reported by the store
    pub total: u64,
    pub events: Vec<Event>,
    /// Per-group counts, only filled for grouped queries
    pub groups: Vec<GroupCount>,
}

impl EventSet {
    /// Event set without store-side aggregation
    pub fn from_events(events: Vec<Event>) -> Self {
        Self {
            total: events.len() as u64,
            events,
            groups: Vec::new(),
        }
    }

    /// Whether the store found nothing to check
    pub fn is_empty(&self) -> bool {
        self.total == 0 || self.events.is_empty()
    }

    /// Per-group counts
    ///
    /// Uses the store's aggregation when present, otherwise counts the
    /// returned events. Events without a value for `key` are not counted.
    pub fn group_counts(&self, key: GroupKey) -> Vec<GroupCount> {
        if !self.groups.is_empty() {
            return self.groups.clone();
        }
        self.group_events(key)
            .into_iter()
            .map(|(key, events)| GroupCount {
                key,
                count: events.len() as u64,
            })
            .collect()
    }

    /// Returned events bucketed by `key`, buckets in first-seen order
    pub fn group_events(&self, key: GroupKey) -> Vec<(String, Vec<&Event>)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<&Event>)> = Vec::new();
        for event in &self.events {
            let Some(value) = event.group_value(key) else {
                continue;
            };
            if let Some(&slot) = index.get(value) {
                groups[slot].1.push(event);
            } else {
                index.insert(value, groups.len());
                groups.push((value.to_string(), vec![event]));
            }
        }
        groups
    }
}

/// Port for the log store holding proxy events
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventStorePort: Send + Sync {
    /// Fetch the events matching a query
    async fn query_events(&self, query: &EventQuery) -> Result<EventSet, ApplicationError>;

    /// Number of error-level entries the proxies logged about themselves
    async fn count_proxy_errors(&self) -> Result<u64, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn request(id: &str) -> Event {
        Event::request("a", "b", Utc::now()).with_request_id(id)
    }

    #[test]
    fn query_builder() {
        let query = EventQuery::for_test("t1")
            .on_edge("a", "b")
            .of_kind(EventKind::Request)
            .of_kind(EventKind::Request)
            .grouped_by(GroupKey::Uri);
        assert_eq!(query.test_id.as_deref(), Some("t1"));
        assert_eq!(query.source.as_deref(), Some("a"));
        assert_eq!(query.kinds, vec![EventKind::Request]);
        assert_eq!(query.group_by, Some(GroupKey::Uri));
    }

    #[test]
    fn empty_set_is_detected() {
        assert!(EventSet::default().is_empty());
        let stale_total = EventSet {
            total: 3,
            events: Vec::new(),
            groups: Vec::new(),
        };
        assert!(stale_total.is_empty());
        assert!(!EventSet::from_events(vec![request("r")]).is_empty());
    }

    #[test]
    fn group_counts_fall_back_to_local_counting() {
        let set = EventSet::from_events(vec![request("r1"), request("r2"), request("r1")]);
        assert_eq!(
            set.group_counts(GroupKey::RequestId),
            vec![
                GroupCount {
                    key: "r1".to_string(),
                    count: 2
                },
                GroupCount {
                    key: "r2".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn store_aggregation_takes_precedence() {
        let set = EventSet {
            total: 1,
            events: vec![request("r1")],
            groups: vec![GroupCount {
                key: "r1".to_string(),
                count: 7,
            }],
        };
        assert_eq!(set.group_counts(GroupKey::RequestId)[0].count, 7);
    }

    #[test]
    fn events_without_group_value_are_skipped() {
        let set = EventSet::from_events(vec![request(""), request("r1")]);
        let groups = set.group_events(GroupKey::RequestId);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "r1");
    }
}
