//! Wiremock integration tests for the HTTP chat backend.
#![cfg(feature = "http")]

use std::sync::Arc;

use amelia::{
    Amelia, AmeliaError, BackendLoader, BackendState, ChatBackend, Dispatcher, HttpBackend,
    HttpLoader, ReplySource, RetryConfig,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_chat_posts_message_and_reads_reply() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(serde_json::json!({"message": "jelaskan rust"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"reply": "Rust adalah bahasa sistem."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(
        reqwest::Client::new(),
        format!("{}/api/chat", mock_server.uri()),
    );
    let reply = backend.chat("jelaskan rust").await.unwrap();
    assert_eq!(reply, "Rust adalah bahasa sistem.");
}

#[tokio::test]
async fn test_plain_text_body_is_the_reply() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("halo juga"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(reqwest::Client::new(), mock_server.uri());
    assert_eq!(backend.chat("halo").await.unwrap(), "halo juga");
}

#[tokio::test]
async fn test_object_without_reply_is_empty_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(reqwest::Client::new(), mock_server.uri());
    let err = backend.chat("halo").await.unwrap_err();
    assert!(matches!(err, AmeliaError::EmptyResponse));
}

#[tokio::test]
async fn test_error_status_maps_to_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(reqwest::Client::new(), mock_server.uri());
    match backend.chat("halo").await {
        Err(AmeliaError::Api { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "model loading");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_loader_probes_health_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let loader = HttpLoader::new(format!("{}/api/chat", mock_server.uri()))
        .health_url(format!("{}/health", mock_server.uri()));
    let backend = loader.load().await.unwrap();
    assert_eq!(backend.name(), "http");
}

#[tokio::test]
async fn test_failed_health_probe_fails_the_load() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::new(Arc::new(
        HttpLoader::new(format!("{}/api/chat", mock_server.uri()))
            .health_url(format!("{}/health", mock_server.uri())),
    ))
    .retry(RetryConfig::disabled());

    let err = dispatcher.chat("halo").await.unwrap_err();
    assert!(matches!(err, AmeliaError::BackendUnavailable(_)));
    assert_eq!(dispatcher.state(), BackendState::Error);
}

#[tokio::test]
async fn test_empty_endpoint_is_a_configuration_error() {
    let err = HttpLoader::new("  ").load().await.err().unwrap();
    assert!(matches!(err, AmeliaError::Configuration(_)));
}

#[tokio::test]
async fn test_orchestrator_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"response": "Machine learning adalah ..."})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let amelia = Amelia::builder()
        .http(format!("{}/api/chat", mock_server.uri()))
        .build()
        .unwrap();

    let first = amelia.process_message("jelaskan konsep machine learning").await;
    assert_eq!(first.source, ReplySource::Remote);
    assert_eq!(first.text, "Machine learning adalah ...");

    let second = amelia.process_message("jelaskan konsep machine learning").await;
    assert!(second.cached);

    // greetings never reach the server
    amelia.process_message("halo").await;
}
