//! Integration tests for the Elasticsearch client using wiremock

use integration_elasticsearch::{
    ElasticsearchClient, ElasticsearchConfig, ElasticsearchError, SearchClient, SearchQuery,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

/// Create a test client configured to use the mock server
///
/// # Panics
///
/// Panics if the client cannot be created (should not happen in tests).
fn create_test_client(mock_server: &MockServer) -> ElasticsearchClient {
    let config = ElasticsearchConfig {
        url: mock_server.uri(),
        index: "gremlin".to_string(),
        max_results: 100,
        timeout_secs: 5,
    };
    #[allow(clippy::expect_used)]
    ElasticsearchClient::new(config).expect("Failed to create client")
}

fn sample_response() -> serde_json::Value {
    json!({
        "took": 3,
        "timed_out": false,
        "hits": {
            "total": { "value": 2, "relation": "eq" },
            "hits": [
                { "_id": "1", "_source": { "msg": "Request", "reqID": "r1", "source": "productpage", "dest": "reviews" } },
                { "_id": "2", "_source": { "msg": "Request", "reqID": "r1", "source": "productpage", "dest": "reviews" } }
            ]
        },
        "aggregations": {
            "byid": { "buckets": [{ "key": "r1", "doc_count": 2 }] }
        }
    })
}

// ============================================================================
// Success scenarios
// ============================================================================

#[tokio::test]
async fn test_search_posts_filtered_query() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gremlin/_search"))
        .and(body_partial_json(json!({
            "size": 100,
            "query": { "bool": { "filter": [{ "term": { "testid": "t1" } }] } },
            "aggs": { "byid": { "terms": { "field": "reqID", "size": 100 } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let response = client
        .search(SearchQuery::new().term("testid", "t1").group_by("reqID"))
        .await
        .unwrap();

    assert_eq!(response.total(), 2);
    assert_eq!(response.sources().count(), 2);
    assert_eq!(response.buckets("byid")[0].doc_count, 2);
}

#[tokio::test]
async fn test_count_query_keeps_zero_size() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gremlin/_search"))
        .and(body_partial_json(json!({ "size": 0 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "hits": { "total": 4, "hits": [] } })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let response = client
        .search(SearchQuery::new().term("level", "error").size(0))
        .await
        .unwrap();

    assert_eq!(response.total(), 4);
}

#[tokio::test]
async fn test_is_healthy() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cluster_name": "logs" })))
        .mount(&mock_server)
        .await;

    assert!(create_test_client(&mock_server).is_healthy().await);
}

// ============================================================================
// Error scenarios
// ============================================================================

#[tokio::test]
async fn test_search_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("parsing_exception"))
        .mount(&mock_server)
        .await;

    let result = create_test_client(&mock_server)
        .search(SearchQuery::new())
        .await;

    match result {
        Err(ElasticsearchError::RequestFailed { status, reason }) => {
            assert_eq!(status, 400);
            assert_eq!(reason, "parsing_exception");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_search_invalid_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&mock_server)
        .await;

    let result = create_test_client(&mock_server)
        .search(SearchQuery::new())
        .await;

    assert!(matches!(result, Err(ElasticsearchError::ParseError(_))));
}

#[tokio::test]
async fn test_cluster_unreachable() {
    let client = ElasticsearchClient::new(ElasticsearchConfig {
        url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 1,
        ..Default::default()
    })
    .unwrap();

    assert!(!client.is_healthy().await);
    assert!(matches!(
        client.search(SearchQuery::new()).await,
        Err(ElasticsearchError::ConnectionFailed(_))
    ));
}
