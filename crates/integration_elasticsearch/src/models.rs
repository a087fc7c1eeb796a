//! `_search` response models

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Total hit count
///
/// Older clusters report a plain number, newer ones an object with a
/// `relation` telling whether the value is exact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Object {
        value: u64,
        #[serde(default)]
        relation: Option<String>,
    },
}

impl TotalHits {
    pub const fn value(&self) -> u64 {
        match self {
            Self::Count(value) | Self::Object { value, .. } => *value,
        }
    }
}

impl Default for TotalHits {
    fn default() -> Self {
        Self::Count(0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: TotalHits,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// One bucket of a terms aggregation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bucket {
    /// String keys stay strings, numeric keys are numbers
    pub key: Value,
    pub doc_count: u64,
}

impl Bucket {
    /// The key rendered as text
    pub fn key_string(&self) -> String {
        match &self.key {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Aggregation {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Hits,
    #[serde(default)]
    pub aggregations: HashMap<String, Aggregation>,
}

impl SearchResponse {
    pub const fn total(&self) -> u64 {
        self.hits.total.value()
    }

    /// `_source` documents of the returned hits
    pub fn sources(&self) -> impl Iterator<Item = &Value> {
        self.hits.hits.iter().map(|hit| &hit.source)
    }

    /// Buckets of the named aggregation, empty if it is absent
    pub fn buckets(&self, aggregation: &str) -> &[Bucket] {
        self.aggregations
            .get(aggregation)
            .map(|agg| agg.buckets.as_slice())
            .unwrap_or_default()
    }
}
