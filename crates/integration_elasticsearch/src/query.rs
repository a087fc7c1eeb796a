//! Search request builder

use serde_json::{Map, Value, json};

/// Name of the terms aggregation added by [`SearchQuery::group_by`]
pub const GROUP_AGGREGATION: &str = "byid";

/// A filtered search with an optional terms aggregation
///
/// All clauses go into a `bool.filter`, so they restrict without scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    filters: Vec<Value>,
    group_field: Option<String>,
    size: Option<usize>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact match on one field
    #[must_use]
    pub fn term(mut self, field: &str, value: impl Into<Value>) -> Self {
        let value: Value = value.into();
        self.filters.push(json!({ "term": { field: value } }));
        self
    }

    /// Match any of several values
    #[must_use]
    pub fn terms(mut self, field: &str, values: Vec<Value>) -> Self {
        self.filters.push(json!({ "terms": { field: values } }));
        self
    }

    /// Values starting with `prefix`
    #[must_use]
    pub fn prefix(mut self, field: &str, prefix: &str) -> Self {
        self.filters.push(json!({ "prefix": { field: prefix } }));
        self
    }

    /// Count documents per distinct value of `field`
    #[must_use]
    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_field = Some(field.into());
        self
    }

    /// Maximum number of hits, also used as the bucket limit
    #[must_use]
    pub const fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Apply `size` unless a size is already set
    #[must_use]
    pub const fn size_or(mut self, size: usize) -> Self {
        if self.size.is_none() {
            self.size = Some(size);
        }
        self
    }

    /// Render the request body
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }
        body.insert("track_total_hits".to_string(), Value::Bool(true));

        let query = if self.filters.is_empty() {
            json!({ "match_all": {} })
        } else {
            json!({ "bool": { "filter": self.filters } })
        };
        body.insert("query".to_string(), query);

        if let Some(field) = &self.group_field {
            let mut terms = json!({ "field": field });
            if let Some(size) = self.size {
                terms["size"] = json!(size);
            }
            body.insert(
                "aggs".to_string(),
                json!({ GROUP_AGGREGATION: { "terms": terms } }),
            );
        }
        Value::Object(body)
    }
}
