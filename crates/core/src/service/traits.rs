//! Trait definitions for the service module.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ConversionError;
use crate::task::{ConversionRequest, TaskHandle, TaskStatus};

/// Submits conversion tasks and reads their status.
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Returns the name of this service implementation.
    fn name(&self) -> &str;

    /// Upload the request's file and create a task.
    async fn submit(&self, request: &ConversionRequest) -> Result<TaskHandle, ConversionError>;

    /// Read the current status of a task.
    async fn query_task(&self, handle: &TaskHandle) -> Result<TaskStatus, ConversionError>;
}

#[async_trait]
impl<S: ConversionService + ?Sized> ConversionService for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn submit(&self, request: &ConversionRequest) -> Result<TaskHandle, ConversionError> {
        (**self).submit(request).await
    }

    async fn query_task(&self, handle: &TaskHandle) -> Result<TaskStatus, ConversionError> {
        (**self).query_task(handle).await
    }
}
