//! Integration tests for error handling and the retry path.
//!
//! Covers:
//! - transient 5xx and 429 responses retried on the deterministic
//!   schedule, with exact request counts
//! - hard 4xx rejections failing fast
//! - retry budget exhaustion and timeout classification

mod helpers;

use helpers::mock_esign_server::MockEsignServer;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use inksync_client::{EsignClient, EsignError};

#[tokio::test]
async fn test_transient_503_retried_until_success() {
    let mock = MockEsignServer::start().await;
    // Two failures, then success: exactly three requests, two retries.
    Mock::given(method("GET"))
        .and(path("/api/rest/v6/groups"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(mock.server())
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v6/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groupInfoList": [{"groupId": "g-1", "groupName": "Default Group"}],
        })))
        .expect(1)
        .mount(mock.server())
        .await;

    let groups = mock.client().get_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
}

#[tokio::test]
async fn test_rate_limited_retried_with_retry_after_reported() {
    let mock = MockEsignServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v6/groups"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .up_to_n_times(1)
        .expect(1)
        .mount(mock.server())
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v6/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"groupInfoList": []})))
        .expect(1)
        .mount(mock.server())
        .await;

    let groups = mock.client().get_groups().await.unwrap();
    assert!(groups.is_empty());
}

#[tokio::test]
async fn test_retry_budget_exhaustion_counts_attempts() {
    let mock = MockEsignServer::start().await;
    // max_retries is 3 in the test config: one attempt plus three
    // retries before giving up.
    Mock::given(method("GET"))
        .and(path("/api/rest/v6/groups"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(mock.server())
        .await;

    match mock.client().get_groups().await {
        Err(EsignError::RetriesExhausted { attempts: 4, message }) => {
            assert!(message.contains("get_groups"), "message: {message}");
        }
        other => panic!("expected RetriesExhausted, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_hard_rejection_fails_fast() {
    let mock = MockEsignServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v6/groups"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such org"))
        .expect(1)
        .mount(mock.server())
        .await;

    match mock.client().get_groups().await {
        Err(EsignError::Rejected { status: 404, reason, .. }) => {
            assert_eq!(reason, "Not Found");
        }
        other => panic!("expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_a_parse_error() {
    let mock = MockEsignServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v6/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(mock.server())
        .await;

    match mock.client().get_groups().await {
        Err(EsignError::Parse { .. }) => {}
        other => panic!("expected Parse, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_response_classified_as_timeout() {
    let mock = MockEsignServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/v6/groups"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"groupInfoList": []}))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(mock.server())
        .await;

    let mut config = mock.config();
    config.timeout = Duration::from_millis(50);
    config.retry.max_retries = 0;
    let client = EsignClient::new(config).unwrap();

    match client.get_groups().await {
        Err(EsignError::RetriesExhausted { attempts: 1, message }) => {
            assert!(message.contains("timed out"), "message: {message}");
        }
        other => panic!("expected RetriesExhausted from a timeout, got: {other:?}"),
    }
}
