//! Mock transport for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ConversionError;
use crate::task::TaskHandle;
use crate::transport::{interpret_response, interpret_upload, Method, Transport};

/// A canned reply for one URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The service answered with `status` and a raw `body`.
    Reply { status: u16, body: String },
    /// No response was received.
    Network(String),
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self::Reply {
            status,
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::Reply {
            status,
            body: body.into(),
        }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network(reason.into())
    }
}

/// A recorded request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method, or `UPLOAD` for multipart uploads.
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
    pub file_path: Option<PathBuf>,
    pub fields: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of the multipart text field `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Mock implementation of the Transport trait.
///
/// Responses are configured per exact URL and run through the same
/// interpretation as the HTTP transport, so status and body handling is
/// shared. When several responses are queued for a URL they are returned in
/// order and the last one repeats. Unconfigured URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<RwLock<HashMap<String, VecDeque<MockResponse>>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `url` with `response`.
    pub async fn set_response(&self, url: &str, response: MockResponse) {
        self.push_responses(url, vec![response]).await;
    }

    /// Answer `url` with `responses` in order, repeating the last.
    pub async fn push_responses(&self, url: &str, responses: Vec<MockResponse>) {
        self.responses
            .write()
            .await
            .insert(url.to_string(), responses.into());
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    async fn next_response(&self, url: &str) -> MockResponse {
        let mut responses = self.responses.write().await;
        let queue = match responses.get_mut(url) {
            Some(queue) if !queue.is_empty() => queue,
            _ => {
                return MockResponse::json(
                    404,
                    serde_json::json!({ "message": format!("no mock response for {url}") }),
                )
            }
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(|| MockResponse::network("empty queue"))
        } else {
            queue[0].clone()
        }
    }

    async fn record(&self, request: RecordedRequest) {
        self.requests.write().await.push(request);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, ConversionError> {
        self.record(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body: body.cloned(),
            file_path: None,
            fields: Vec::new(),
        })
        .await;

        match self.next_response(url).await {
            MockResponse::Reply { status, body } => interpret_response(status, &body),
            MockResponse::Network(reason) => Err(ConversionError::network(reason)),
        }
    }

    async fn upload(
        &self,
        url: &str,
        file_path: &Path,
        fields: &[(&'static str, String)],
    ) -> Result<TaskHandle, ConversionError> {
        self.record(RecordedRequest {
            method: "UPLOAD".to_string(),
            url: url.to_string(),
            body: None,
            file_path: Some(file_path.to_path_buf()),
            fields: fields
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        })
        .await;

        match self.next_response(url).await {
            MockResponse::Reply { status, body } => interpret_upload(status, &body),
            MockResponse::Network(reason) => Err(ConversionError::network(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queued_responses_repeat_last() {
        let transport = MockTransport::new();
        transport
            .push_responses(
                "http://x/a",
                vec![
                    MockResponse::json(200, json!({ "n": 1 })),
                    MockResponse::json(200, json!({ "n": 2 })),
                ],
            )
            .await;

        for expected in [1, 2, 2] {
            let body = transport.send(Method::GET, "http://x/a", None).await.unwrap();
            assert_eq!(body["n"], expected);
        }
        assert_eq!(transport.request_count().await, 3);
    }

    #[tokio::test]
    async fn test_unconfigured_url_is_not_found() {
        let transport = MockTransport::new();
        let err = transport
            .send(Method::GET, "http://x/missing", None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }
}
