//! The reqwest-backed client against a local mock server.

use courier_test_utils::{assert_err, assert_ok};
use courier_transport::{
    BaseUriBuilder, DecodingError, Error, HttpClient, HttpConfig, HttpError, JsonRequest,
    JsonTransport, Target,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer, config: HttpConfig) -> JsonTransport<HttpClient, BaseUriBuilder> {
    JsonTransport::with_default_factories(
        HttpClient::with_config(config).unwrap(),
        BaseUriBuilder::new(&server.uri()).unwrap(),
    )
}

#[tokio::test]
async fn test_post_sends_json_and_decodes_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({ "a": 1 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let decoded = assert_ok!(
        transport(&server, HttpConfig::default())
            .call(&JsonRequest::post("/items", json!({ "a": 1 })))
            .await
    );
    assert_eq!(decoded.into_value(), json!({ "ok": true }));
}

#[tokio::test]
async fn test_get_sends_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let target = Target::new("/items").with_parameter("page", 2);
    let decoded = assert_ok!(
        transport(&server, HttpConfig::default())
            .call(&JsonRequest::get(target))
            .await
    );
    assert!(decoded.is_empty());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(path("/items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let error = assert_err!(
        transport(&server, HttpConfig::default())
            .call(&JsonRequest::get("/items"))
            .await
    );
    match error {
        Error::Transport(HttpError::ServerError { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(path("/items"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
        .mount(&server)
        .await;

    let error = assert_err!(
        transport(&server, HttpConfig::default())
            .call(&JsonRequest::get("/items"))
            .await
    );
    match error.transport() {
        Some(HttpError::RateLimited { retry_after }) => {
            assert_eq!(*retry_after, Some(Duration::from_secs(3)));
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_statuses_decode_when_status_checks_are_off() {
    let server = MockServer::start().await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "not found" })))
        .mount(&server)
        .await;

    let config = HttpConfig {
        error_for_status: false,
        ..HttpConfig::default()
    };
    let decoded = assert_ok!(
        transport(&server, config)
            .call(&JsonRequest::get("/missing"))
            .await
    );
    assert_eq!(decoded.get("error"), Some(&json!("not found")));
}

#[tokio::test]
async fn test_invalid_body_is_decoding_error() {
    let server = MockServer::start().await;
    Mock::given(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let error = assert_err!(
        transport(&server, HttpConfig::default())
            .call(&JsonRequest::get("/items"))
            .await
    );
    assert!(matches!(error, Error::Decoding(DecodingError::Malformed(_))));
}

#[tokio::test]
async fn test_request_timeout_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = HttpConfig {
        request_timeout: Duration::from_millis(100),
        ..HttpConfig::default()
    };
    let error = assert_err!(
        transport(&server, config)
            .call(&JsonRequest::get("/slow"))
            .await
    );
    assert!(matches!(error, Error::Transport(HttpError::Timeout)));
}
