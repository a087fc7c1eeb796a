//! Event store adapter - Implements EventStorePort using integration_elasticsearch

use application::error::ApplicationError;
use application::ports::{EventQuery, EventSet, EventStorePort, GroupCount};
use async_trait::async_trait;
use domain::GroupKey;
use integration_elasticsearch::{
    ElasticsearchClient, ElasticsearchConfig, ElasticsearchError, GROUP_AGGREGATION,
    SearchClient, SearchQuery, SearchResponse,
};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::log_document::{self, fields};

/// Reads proxy events from an Elasticsearch cluster
#[derive(Debug)]
pub struct ElasticsearchEventStore {
    client: ElasticsearchClient,
}

impl ElasticsearchEventStore {
    /// Create a store for the given cluster
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn new(config: ElasticsearchConfig) -> Result<Self, ApplicationError> {
        let client = ElasticsearchClient::new(config).map_err(Self::map_error)?;
        Ok(Self { client })
    }

    /// Check if the cluster answers
    pub async fn is_healthy(&self) -> bool {
        self.client.is_healthy().await
    }

    fn map_error(err: ElasticsearchError) -> ApplicationError {
        ApplicationError::Transport(format!("log store: {err}"))
    }

    /// Translate an event query into a search
    fn build_search(query: &EventQuery) -> SearchQuery {
        let mut search = SearchQuery::new();
        if let Some(test_id) = &query.test_id {
            search = search.term(fields::TEST_ID, test_id.as_str());
        }
        if let Some(source) = &query.source {
            search = search.term(fields::SOURCE, source.as_str());
        }
        if let Some(dest) = &query.dest {
            search = search.term(fields::DEST, dest.as_str());
        }
        search = match query.kinds.as_slice() {
            [] => search,
            [kind] => search.term(fields::MESSAGE, kind.as_str()),
            kinds => search.terms(
                fields::MESSAGE,
                kinds.iter().map(|k| Value::from(k.as_str())).collect(),
            ),
        };
        if let Some(request_id) = &query.request_id {
            search = search.term(fields::REQUEST_ID, request_id.as_str());
        }
        if let Some(tracking) = &query.tracking {
            search = search.prefix(&tracking.log_field(), tracking.pattern());
        }
        if let Some(key) = query.group_by {
            search = search.group_by(Self::group_field(key, query));
        }
        search
    }

    fn group_field(key: GroupKey, query: &EventQuery) -> String {
        match key {
            GroupKey::Uri => fields::URI.to_string(),
            GroupKey::TrackingValue => query
                .tracking
                .as_ref()
                .map_or_else(|| fields::REQUEST_ID.to_string(), |t| t.log_field()),
            GroupKey::RequestId => fields::REQUEST_ID.to_string(),
        }
    }

    fn to_event_set(query: &EventQuery, response: &SearchResponse) -> EventSet {
        let tracking_field = query.tracking.as_ref().map(|t| t.log_field());
        let events = response
            .sources()
            .filter_map(|doc| {
                log_document::to_event(doc, tracking_field.as_deref())
                    .map_err(|skipped| debug!(reason = ?skipped, "Skipping log document"))
                    .ok()
            })
            .collect::<Vec<_>>();

        let groups = response
            .buckets(GROUP_AGGREGATION)
            .iter()
            .map(|bucket| GroupCount {
                key: bucket.key_string(),
                count: bucket.doc_count,
            })
            .collect();

        if response.total() > events.len() as u64 {
            warn!(
                total = response.total(),
                returned = events.len(),
                "Log store matched more documents than were mapped"
            );
        }

        EventSet {
            total: response.total(),
            events,
            groups,
        }
    }
}

#[async_trait]
impl EventStorePort for ElasticsearchEventStore {
    #[instrument(skip(self, query), fields(test_id = ?query.test_id, source = ?query.source, dest = ?query.dest))]
    async fn query_events(&self, query: &EventQuery) -> Result<EventSet, ApplicationError> {
        let search = Self::build_search(query);
        let response = self.client.search(search).await.map_err(Self::map_error)?;
        let set = Self::to_event_set(query, &response);
        debug!(
            total = set.total,
            events = set.events.len(),
            groups = set.groups.len(),
            "Queried events"
        );
        Ok(set)
    }

    #[instrument(skip(self))]
    async fn count_proxy_errors(&self) -> Result<u64, ApplicationError> {
        let search = SearchQuery::new().term(fields::LEVEL, "error").size(0);
        let response = self.client.search(search).await.map_err(Self::map_error)?;
        Ok(response.total())
    }
}
