//! Mock conversion service for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::ConversionError;
use crate::service::ConversionService;
use crate::task::{ConversionRequest, TaskHandle, TaskStatus};

/// Origin used in default result URLs, as a locally run service reports them.
pub const MOCK_RESULT_ORIGIN: &str = "http://localhost:8000";

/// A failure the mock can be told to produce.
#[derive(Debug, Clone)]
pub enum MockFailure {
    Network(String),
    Http(u16, String),
    Protocol(String),
}

impl MockFailure {
    pub fn to_error(&self) -> ConversionError {
        match self {
            MockFailure::Network(reason) => ConversionError::network(reason.clone()),
            MockFailure::Http(status, message) => ConversionError::http(*status, message.clone()),
            MockFailure::Protocol(reason) => ConversionError::protocol(reason.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct MockServiceState {
    next_id: u64,
    task_ids: HashMap<PathBuf, String>,
    submit_failures: HashMap<PathBuf, MockFailure>,
    query_failures: HashMap<PathBuf, MockFailure>,
    scripts: HashMap<PathBuf, Vec<TaskStatus>>,
    /// task id -> request and the statuses still to replay
    tasks: HashMap<String, (ConversionRequest, VecDeque<TaskStatus>)>,
    submissions: Vec<ConversionRequest>,
    queries: Vec<String>,
}

/// Mock implementation of the ConversionService trait.
///
/// Behavior is configured per file path:
/// - Task ids are generated (`task-1`, `task-2`, ...) unless set explicitly
/// - Status scripts replay in order and repeat their last entry
/// - Without a script a task finishes on the first query with a result URL
///   under [`MOCK_RESULT_ORIGIN`]
/// - Submissions and queries can be made to fail
///
/// Every submit and query is recorded for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockConversionService {
    state: Arc<RwLock<MockServiceState>>,
    query_delay: Arc<RwLock<Option<Duration>>>,
}

impl MockConversionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `task_id` for submissions of `path`.
    pub async fn set_task_id(&self, path: impl AsRef<Path>, task_id: &str) {
        self.state
            .write()
            .await
            .task_ids
            .insert(path.as_ref().to_path_buf(), task_id.to_string());
    }

    /// Statuses returned for tasks created from `path`.
    pub async fn set_status_script(&self, path: impl AsRef<Path>, script: Vec<TaskStatus>) {
        self.state
            .write()
            .await
            .scripts
            .insert(path.as_ref().to_path_buf(), script);
    }

    /// Make every submission of `path` fail.
    pub async fn fail_submission(&self, path: impl AsRef<Path>, failure: MockFailure) {
        self.state
            .write()
            .await
            .submit_failures
            .insert(path.as_ref().to_path_buf(), failure);
    }

    /// Make every status query for tasks of `path` fail.
    pub async fn fail_queries(&self, path: impl AsRef<Path>, failure: MockFailure) {
        self.state
            .write()
            .await
            .query_failures
            .insert(path.as_ref().to_path_buf(), failure);
    }

    /// Remove configured failures for `path`.
    pub async fn clear_failures(&self, path: impl AsRef<Path>) {
        let mut state = self.state.write().await;
        state.submit_failures.remove(path.as_ref());
        state.query_failures.remove(path.as_ref());
    }

    /// Delay applied to each status query.
    pub async fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.write().await = Some(delay);
    }

    /// Get all submitted requests.
    pub async fn submissions(&self) -> Vec<ConversionRequest> {
        self.state.read().await.submissions.clone()
    }

    /// Get the task ids of all status queries, in order.
    pub async fn queries(&self) -> Vec<String> {
        self.state.read().await.queries.clone()
    }

    pub async fn submission_count(&self) -> usize {
        self.state.read().await.submissions.len()
    }

    fn default_script(task_id: &str, request: &ConversionRequest) -> VecDeque<TaskStatus> {
        VecDeque::from([TaskStatus::finished(format!(
            "{MOCK_RESULT_ORIGIN}/download/{task_id}.{}",
            request.target_format
        ))])
    }
}

#[async_trait]
impl ConversionService for MockConversionService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, request: &ConversionRequest) -> Result<TaskHandle, ConversionError> {
        let mut state = self.state.write().await;
        state.submissions.push(request.clone());

        let path = request.file_path();
        if let Some(failure) = state.submit_failures.get(path) {
            return Err(failure.to_error());
        }

        state.next_id += 1;
        let task_id = match state.task_ids.get(path) {
            Some(id) => id.clone(),
            None => format!("task-{}", state.next_id),
        };
        let script = match state.scripts.get(path) {
            Some(script) if !script.is_empty() => script.iter().cloned().collect(),
            _ => Self::default_script(&task_id, request),
        };
        state
            .tasks
            .insert(task_id.clone(), (request.clone(), script));

        Ok(TaskHandle::new(task_id))
    }

    async fn query_task(&self, handle: &TaskHandle) -> Result<TaskStatus, ConversionError> {
        let delay = *self.query_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        state.queries.push(handle.task_id.clone());

        let failure = state
            .tasks
            .get(handle.as_str())
            .and_then(|(request, _)| state.query_failures.get(request.file_path()))
            .cloned();
        if let Some(failure) = failure {
            return Err(failure.to_error());
        }

        let Some((_, script)) = state.tasks.get_mut(handle.as_str()) else {
            return Err(ConversionError::http(404, "task not found"));
        };
        let status = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        status.ok_or_else(|| ConversionError::protocol("empty status script"))
    }
}
