//! reqwest-backed transport implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Method, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ConversionError;
use crate::metrics;
use crate::task::TaskHandle;

use super::response::{interpret_response, interpret_upload};
use super::Transport;

/// Transport talking to the service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the timeout and user agent from `config`.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Read status and body text from a response.
    async fn read(
        operation: &'static str,
        response: Response,
    ) -> Result<(u16, String), ConversionError> {
        let status = response.status().as_u16();
        let status_label = status.to_string();
        metrics::HTTP_REQUESTS
            .with_label_values(&[operation, status_label.as_str()])
            .inc();

        let body = response.text().await.map_err(|e| {
            ConversionError::network(format!("failed to read response body: {e}"))
        })?;
        Ok((status, body))
    }
}

/// Map a failure where no response was received.
fn request_failed(operation: &'static str, url: &str, e: reqwest::Error) -> ConversionError {
    metrics::HTTP_REQUESTS
        .with_label_values(&[operation, "network"])
        .inc();
    warn!(url = %url, error = %e, "HTTP {} failed", operation);

    if e.is_timeout() {
        ConversionError::network(format!("request timed out: {e}"))
    } else if e.is_connect() {
        ConversionError::network(format!("connection failed: {e}"))
    } else {
        ConversionError::network(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, ConversionError> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| request_failed("send", url, e))?;
        let (status, text) = Self::read("send", response).await?;

        debug!(method = %method, url = %url, status, "HTTP request complete");
        interpret_response(status, &text)
    }

    async fn upload(
        &self,
        url: &str,
        file_path: &Path,
        fields: &[(&'static str, String)],
    ) -> Result<TaskHandle, ConversionError> {
        let bytes = tokio::fs::read(file_path).await?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let size = bytes.len();

        let mut form = multipart::Form::new();
        for (name, value) in fields {
            form = form.text(*name, value.clone());
        }
        form = form.part("file", multipart::Part::bytes(bytes).file_name(file_name));

        debug!(url = %url, path = %file_path.display(), size, "Uploading file");

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_failed("upload", url, e))?;
        let (status, text) = Self::read("upload", response).await?;

        debug!(url = %url, status, "Upload complete");
        interpret_upload(status, &text)
    }
}
