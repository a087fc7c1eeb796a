//! Integration tests for the proxy and control plane clients using wiremock

use domain::{FaultRule, TrackingHeader};
use integration_proxy::{
    ControlPlaneClient, ControlPlaneConfig, ControlPlaneRule, GremlinProxyClient, ProxyClient,
    ProxyConfig, ProxyError, RulePayload, RuleUpdate,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_partial_json, header, method, path},
};

/// Create a proxy client with a short timeout
///
/// # Panics
///
/// Panics if the client cannot be created (should not happen in tests).
fn create_test_client() -> GremlinProxyClient {
    let config = ProxyConfig {
        timeout_secs: 5,
        ..Default::default()
    };
    #[allow(clippy::expect_used)]
    GremlinProxyClient::new(config).expect("Failed to create client")
}

fn instance(mock_server: &MockServer) -> String {
    mock_server.address().to_string()
}

fn abort_rule() -> RulePayload {
    RulePayload::from(&FaultRule::new("productpage", "reviews").with_abort(1.0, 503))
}

// ============================================================================
// Proxy management API
// ============================================================================

#[tokio::test]
async fn test_add_rule_posts_flat_payload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gremlin/v1/rules/add"))
        .and(body_partial_json(json!({
            "source": "productpage",
            "dest": "reviews",
            "abortprobability": 1.0,
            "errorcode": 503,
            "messagetype": "request"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client();
    let result = client.add_rule(&instance(&mock_server), &abort_rule()).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_add_rule_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gremlin/v1/rules/add"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad rule"))
        .mount(&mock_server)
        .await;

    let client = create_test_client();
    let result = client.add_rule(&instance(&mock_server), &abort_rule()).await;

    assert!(matches!(
        result,
        Err(ProxyError::RequestFailed { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_clear_rules_sends_delete() {
    let mock_server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/gremlin/v1/rules"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client();
    assert!(client.clear_rules(&instance(&mock_server)).await.is_ok());
}

#[tokio::test]
async fn test_list_rules_returns_body() {
    let mock_server = MockServer::start().await;
    let installed = json!([{ "source": "productpage", "dest": "reviews" }]);
    Mock::given(method("GET"))
        .and(path("/gremlin/v1/rules/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(installed.clone()))
        .mount(&mock_server)
        .await;

    let client = create_test_client();
    let rules = client.list_rules(&instance(&mock_server)).await.unwrap();

    assert_eq!(rules, installed);
}

#[tokio::test]
async fn test_list_rules_invalid_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gremlin/v1/rules/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = create_test_client();
    let result = client.list_rules(&instance(&mock_server)).await;

    assert!(matches!(result, Err(ProxyError::ParseError(_))));
}

#[tokio::test]
async fn test_start_test_puts_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/gremlin/v1/test/abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client();
    assert!(
        client
            .start_test(&instance(&mock_server), "abc123")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_unreachable_instance() {
    let client = create_test_client();
    let result = client.clear_rules("127.0.0.1:1").await;

    assert!(matches!(result, Err(ProxyError::ConnectionFailed(_))));
}

// ============================================================================
// Control plane API
// ============================================================================

fn control_plane(mock_server: &MockServer) -> ControlPlaneClient {
    let config = ControlPlaneConfig::new(format!("{}/v1/rules", mock_server.uri()), "token-123");
    #[allow(clippy::expect_used)]
    ControlPlaneClient::new(config).expect("Failed to create client")
}

#[tokio::test]
async fn test_put_rules_sends_batch_with_token() {
    let mock_server = MockServer::start().await;
    let tracking = TrackingHeader::with_default_name("test-7").unwrap();
    let rule = FaultRule::new("productpage", "reviews").with_delay(1.0, "250ms");
    let update = RuleUpdate::new(
        &tracking,
        vec![ControlPlaneRule::from_rule(&rule, &tracking).unwrap()],
    );

    Mock::given(method("PUT"))
        .and(path("/v1/rules"))
        .and(header("Authorization", "Bearer token-123"))
        .and(body_json(json!({
            "req_tracking_header": "X-Gremlin-ID",
            "filters": {
                "rules": [{
                    "source": "productpage",
                    "destination": "reviews",
                    "header": "X-Gremlin-ID",
                    "pattern": "test-7",
                    "delay_probability": 1.0,
                    "abort_probability": 0.0,
                    "delay": 0.25,
                    "return_code": -1
                }]
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert!(control_plane(&mock_server).put_rules(&update).await.is_ok());
}

#[tokio::test]
async fn test_put_rules_unauthorized() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let tracking = TrackingHeader::with_default_name("test-7").unwrap();
    let result = control_plane(&mock_server)
        .put_rules(&RuleUpdate::new(&tracking, Vec::new()))
        .await;

    assert!(matches!(result, Err(ProxyError::Unauthorized(_))));
}

#[tokio::test]
async fn test_put_rules_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let tracking = TrackingHeader::with_default_name("test-7").unwrap();
    let err = control_plane(&mock_server)
        .put_rules(&RuleUpdate::new(&tracking, Vec::new()))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
}
