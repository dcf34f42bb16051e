//! HTTP transport for the conversion service.
//!
//! [`Transport`] performs exactly one request per call and maps every
//! failure into [`ConversionError`]: no response at all becomes
//! `Network`, a non-2xx status becomes `Http`, and a malformed success
//! becomes `Protocol`. It never retries.

mod http;
mod response;

pub use http::HttpTransport;
pub use reqwest::Method;
pub use response::{interpret_response, interpret_upload, snippet, SNIPPET_CHARS};

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ConversionError;
use crate::task::TaskHandle;

/// A transport able to reach the conversion service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a JSON request and return the parsed body of a 2xx response.
    ///
    /// An empty or `null` body resolves to an empty JSON object.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, ConversionError>;

    /// Upload `file_path` as multipart field `file` together with `fields`,
    /// returning the task identifier from the response.
    async fn upload(
        &self,
        url: &str,
        file_path: &Path,
        fields: &[(&'static str, String)],
    ) -> Result<TaskHandle, ConversionError>;
}
