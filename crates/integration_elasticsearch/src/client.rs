//! Elasticsearch HTTP client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::SearchResponse;
use crate::query::SearchQuery;

/// Elasticsearch client errors
#[derive(Debug, Error)]
pub enum ElasticsearchError {
    /// Connection to the cluster failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The cluster rejected the request
    #[error("Search failed with HTTP {status}: {reason}")]
    RequestFailed { status: u16, reason: String },

    /// Failed to parse the search response
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Elasticsearch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Cluster base URL (default: http://localhost:9200)
    #[serde(default = "default_url")]
    pub url: String,

    /// Index or index pattern holding proxy logs (default: _all)
    #[serde(default = "default_index")]
    pub index: String,

    /// Upper bound on hits and buckets per query (default: 10000)
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_index() -> String {
    "_all".to_string()
}

const fn default_max_results() -> usize {
    10_000
}

const fn default_timeout() -> u64 {
    30
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            index: default_index(),
            max_results: default_max_results(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Search access to the log store
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a search; the configured result limit applies when the query sets none
    async fn search(&self, query: SearchQuery) -> Result<SearchResponse, ElasticsearchError>;

    /// Check if the cluster answers
    async fn is_healthy(&self) -> bool;
}

/// HTTP client for the Elasticsearch `_search` API
#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    client: Client,
    config: ElasticsearchConfig,
}

impl ElasticsearchClient {
    /// Create a new client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: ElasticsearchConfig) -> Result<Self, ElasticsearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ElasticsearchError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    fn search_url(&self) -> String {
        format!(
            "{}/{}/_search",
            self.config.url.trim_end_matches('/'),
            self.config.index
        )
    }
}

#[async_trait]
impl SearchClient for ElasticsearchClient {
    #[instrument(skip(self, query), fields(index = %self.config.index))]
    async fn search(&self, query: SearchQuery) -> Result<SearchResponse, ElasticsearchError> {
        let url = self.search_url();
        let body = query.size_or(self.config.max_results).to_body();
        debug!(url = %url, "Searching log store");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ElasticsearchError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(ElasticsearchError::RequestFailed {
                status: status.as_u16(),
                reason,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ElasticsearchError::ParseError(e.to_string()))?;
        debug!(total = parsed.total(), hits = parsed.hits.hits.len(), "Search completed");
        Ok(parsed)
    }

    async fn is_healthy(&self) -> bool {
        self.client
            .get(&self.config.url)
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ElasticsearchConfig::default();
        assert_eq!(config.url, "http://localhost:9200");
        assert_eq!(config.index, "_all");
        assert_eq!(config.max_results, 10_000);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_search_url() {
        let client = ElasticsearchClient::new(ElasticsearchConfig {
            url: "http://es:9200/".to_string(),
            index: "gremlin-*".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.search_url(), "http://es:9200/gremlin-*/_search");
    }

    #[test]
    fn test_error_display() {
        let err = ElasticsearchError::RequestFailed {
            status: 400,
            reason: "parsing_exception".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Search failed with HTTP 400: parsing_exception"
        );
    }
}
