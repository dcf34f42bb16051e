//! Conversion service client built on a [`Transport`].

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{resolve_base_url, ApiConfig};
use crate::error::ConversionError;
use crate::formats::{parse_supported_formats, FormatTable};
use crate::metrics;
use crate::task::{Category, ConversionRequest, TaskHandle, TaskStatus};
use crate::transport::{Method, Transport};

use super::traits::ConversionService;

/// Client for the conversion service endpoints.
///
/// Every URL is built from the base URL resolved once at construction.
#[derive(Debug, Clone)]
pub struct ConvertClient<T: Transport> {
    transport: T,
    base_url: String,
}

impl<T: Transport> ConvertClient<T> {
    /// Create a client using the base URL from `config`.
    pub fn new(transport: T, config: &ApiConfig) -> Self {
        Self {
            transport,
            base_url: config.resolved_base_url(),
        }
    }

    /// Create a client with an explicit base URL override.
    pub fn with_base_url(transport: T, base_url: Option<&str>) -> Self {
        Self {
            transport,
            base_url: resolve_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn upload_url(&self) -> String {
        format!("{}/convert/upload", self.base_url)
    }

    fn task_url(&self, task_id: &str) -> String {
        format!(
            "{}/convert/task/{}",
            self.base_url,
            urlencoding::encode(task_id)
        )
    }

    fn formats_url(&self, category: Category) -> String {
        format!(
            "{}/supported-formats?category={}",
            self.base_url,
            category.as_str()
        )
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// Fetch the service's conversion table for `category`.
    pub async fn supported_formats(
        &self,
        category: Category,
    ) -> Result<FormatTable, ConversionError> {
        let body = self
            .transport
            .send(Method::GET, &self.formats_url(category), None)
            .await?;
        parse_supported_formats(category, &body)
    }

    /// Raw body of the health endpoint.
    pub async fn health_check(&self) -> Result<Value, ConversionError> {
        self.transport
            .send(Method::GET, &self.health_url(), None)
            .await
    }

    /// Whether the service reports itself healthy. Never fails.
    pub async fn check_health(&self) -> bool {
        match self.health_check().await {
            Ok(body) => {
                let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
                if !ok {
                    warn!(base_url = %self.base_url, "Service health check reported not ok");
                }
                ok
            }
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "Service health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl<T: Transport> ConversionService for ConvertClient<T> {
    fn name(&self) -> &str {
        "convertease"
    }

    async fn submit(&self, request: &ConversionRequest) -> Result<TaskHandle, ConversionError> {
        let category = request.category.as_str();
        let result = self
            .transport
            .upload(
                &self.upload_url(),
                request.file_path(),
                &request.form_fields(),
            )
            .await;

        match &result {
            Ok(handle) => {
                metrics::TASKS_SUBMITTED
                    .with_label_values(&[category, "success"])
                    .inc();
                info!(
                    task_id = %handle,
                    category,
                    target = %request.target_format,
                    file = %request.file_path().display(),
                    "Conversion task submitted"
                );
            }
            Err(e) => {
                metrics::TASKS_SUBMITTED
                    .with_label_values(&[category, "error"])
                    .inc();
                warn!(
                    category,
                    file = %request.file_path().display(),
                    error = %e,
                    "Conversion task submission failed"
                );
            }
        }

        result
    }

    async fn query_task(&self, handle: &TaskHandle) -> Result<TaskStatus, ConversionError> {
        let body = self
            .transport
            .send(Method::GET, &self.task_url(handle.as_str()), None)
            .await?;

        let status: TaskStatus = serde_json::from_value(body).map_err(|e| {
            ConversionError::protocol(format!("unrecognized task status: {e}"))
        })?;
        debug!(task_id = %handle, state = status.state.as_str(), "Queried task");
        Ok(status)
    }
}
