//! Elasticsearch integration
//!
//! Minimal client for the `_search` API of the log store the proxies ship
//! their access logs to, plus a builder for the small subset of the query
//! DSL the checks need.

pub mod client;
mod models;
mod query;

pub use client::{ElasticsearchClient, ElasticsearchConfig, ElasticsearchError, SearchClient};
pub use models::{Aggregation, Bucket, Hit, Hits, SearchResponse, TotalHits};
pub use query::{GROUP_AGGREGATION, SearchQuery};
