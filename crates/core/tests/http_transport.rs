//! HTTP transport integration tests against a local mock server.

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use convertease_core::{
    testing::fixtures, transport::Method, ApiConfig, Category, ConversionError,
    ConversionRequest, ConversionService, ConvertClient, FormatCatalog, HttpTransport, TaskState,
    Transport,
};

fn transport() -> HttpTransport {
    let config = ApiConfig {
        request_timeout_secs: 5,
        ..Default::default()
    };
    HttpTransport::new(&config).expect("client builds")
}

fn client(server: &MockServer) -> ConvertClient<HttpTransport> {
    ConvertClient::with_base_url(transport(), Some(&format!("{}/", server.uri())))
}

fn upload_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents).expect("write temp file");
    file
}

#[tokio::test]
async fn test_send_parses_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/convert/task/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "queued" })))
        .mount(&server)
        .await;

    let body = assert_ok!(
        transport()
            .send(Method::GET, &format!("{}/convert/task/t-1", server.uri()), None)
            .await
    );
    assert_eq!(body["state"], "queued");
}

#[tokio::test]
async fn test_send_empty_body_is_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let body = assert_ok!(
        transport()
            .send(Method::GET, &format!("{}/empty", server.uri()), None)
            .await
    );
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_send_error_prefers_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/convert/task/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "task not found" })),
        )
        .mount(&server)
        .await;

    let err = assert_err!(
        transport()
            .send(
                Method::GET,
                &format!("{}/convert/task/missing", server.uri()),
                None
            )
            .await
    );
    assert!(matches!(
        err,
        ConversionError::Http { status_code: 404, ref message } if message == "task not found"
    ));
}

#[tokio::test]
async fn test_send_error_without_message_quotes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = assert_err!(
        transport()
            .send(Method::GET, &format!("{}/health", server.uri()), None)
            .await
    );
    assert_eq!(err.to_string(), "HTTP 502: request failed (502) Bad Gateway");
}

#[tokio::test]
async fn test_send_non_json_success_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = assert_err!(
        transport()
            .send(Method::GET, &format!("{}/health", server.uri()), None)
            .await
    );
    assert!(matches!(err, ConversionError::Protocol { .. }));
    assert!(err.to_string().contains("<html>oops</html>"));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let err = assert_err!(
        transport()
            .send(Method::GET, "http://127.0.0.1:1/health", None)
            .await
    );
    assert!(matches!(err, ConversionError::Network { .. }));
}

#[tokio::test]
async fn test_upload_sends_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert/upload"))
        .and(body_string_contains("name=\"file\"; filename=\""))
        .and(body_string_contains("name=\"category\""))
        .and(body_string_contains("name=\"source\""))
        .and(body_string_contains("%PDF-1.4 test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "taskId": "abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let file = upload_file(b"%PDF-1.4 test");
    let request = ConversionRequest::document(file.path(), "pdf", "docx");

    let handle = assert_ok!(client(&server).submit(&request).await);
    assert_eq!(handle.as_str(), "abc");
}

#[tokio::test]
async fn test_upload_missing_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "taskId": "" })))
        .mount(&server)
        .await;

    let file = upload_file(b"RIFF");
    let request = ConversionRequest::audio(file.path(), "mp3");

    let err = assert_err!(client(&server).submit(&request).await);
    assert!(matches!(err, ConversionError::Protocol { .. }));
}

#[tokio::test]
async fn test_upload_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert/upload"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Unsupported format" })),
        )
        .mount(&server)
        .await;

    let file = upload_file(b"RIFF");
    let err = assert_err!(
        client(&server)
            .submit(&ConversionRequest::audio(file.path(), "mp3"))
            .await
    );
    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.to_string(), "HTTP 400: Unsupported format");
}

#[tokio::test]
async fn test_upload_unreadable_file_is_io_error() {
    let server = MockServer::start().await;
    let request = ConversionRequest::audio("/nonexistent/input.wav", "mp3");

    let err = assert_err!(client(&server).submit(&request).await);
    assert!(matches!(err, ConversionError::Io(_)));
}

#[tokio::test]
async fn test_query_task_reads_legacy_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/convert/task/t-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "finished",
            "url": null,
            "downloadUrl": "http://localhost:8000/download/out.mp3",
            "previewUrl": "http://localhost:8000/preview/out.mp3"
        })))
        .mount(&server)
        .await;

    let status = assert_ok!(
        client(&server)
            .query_task(&convertease_core::TaskHandle::new("t-9"))
            .await
    );
    assert_eq!(status.state, TaskState::Finished);
    assert_eq!(
        status.result_url(),
        Some("http://localhost:8000/download/out.mp3")
    );
}

#[tokio::test]
async fn test_catalog_refresh_and_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/supported-formats"))
        .and(query_param("category", "audio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::supported_formats_body(
            Category::Audio,
            json!({ ".mp3": [".wav"] }),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/supported-formats"))
        .and(query_param("category", "document"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut catalog = FormatCatalog::new();

    assert!(catalog.refresh(&client, Category::Audio).await);
    assert!(catalog.is_remote(Category::Audio));
    assert!(catalog.supports(Category::Audio, "mp3", "wav"));
    assert!(!catalog.supports(Category::Audio, "mp3", "ogg"));

    assert!(!catalog.refresh(&client, Category::Document).await);
    assert!(!catalog.is_remote(Category::Document));
    assert!(catalog.supports(Category::Document, "pdf", "docx"));
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::health_body(true)))
        .mount(&server)
        .await;

    let client = client(&server);
    let body = assert_ok!(client.health_check().await);
    assert_eq!(body["service"], "convertease");
    assert!(client.check_health().await);

    let unreachable = ConvertClient::with_base_url(transport(), Some("http://127.0.0.1:1"));
    assert!(!unreachable.check_health().await);
}
