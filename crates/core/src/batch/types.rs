//! Types for the batch orchestrator.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::host::HostError;
use crate::task::{Category, ConversionRequest, TaskHandle};

/// Errors that can occur while managing a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A run or retry is already in progress.
    #[error("batch is already running")]
    AlreadyRunning,

    /// Item not found.
    #[error("batch item not found: {0}")]
    ItemNotFound(String),

    /// Invalid item state for operation.
    #[error("invalid item state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// The item is being converted and cannot be removed.
    #[error("batch item is processing: {0}")]
    ItemProcessing(String),

    /// Host operation error.
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// Lifecycle of a batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Success,
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Success => "success",
            ItemStatus::Error => "error",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file in a batch.
///
/// `result_url` is set exactly when the status is `Success`, and `error`
/// exactly when it is `Error`. Only the transition methods change status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: String,
    /// Display name of the file.
    pub name: String,
    pub size: u64,
    pub request: ConversionRequest,
    pub status: ItemStatus,
    /// Task of the latest attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskHandle>,
    /// Normalized result URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchItem {
    pub fn new(request: ConversionRequest, name: impl Into<String>, size: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            size,
            request,
            status: ItemStatus::Pending,
            task: None,
            result_url: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Start an attempt, clearing the outcome of any previous one.
    pub(crate) fn begin(&mut self) {
        self.status = ItemStatus::Processing;
        self.task = None;
        self.result_url = None;
        self.error = None;
        self.started_at = Some(Utc::now());
        self.finished_at = None;
    }

    pub(crate) fn attach_task(&mut self, handle: TaskHandle) {
        self.task = Some(handle);
    }

    pub(crate) fn succeed(&mut self, result_url: String) {
        self.status = ItemStatus::Success;
        self.result_url = Some(result_url);
        self.error = None;
        self.finished_at = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = ItemStatus::Error;
        self.result_url = None;
        self.error = Some(message);
        self.finished_at = Some(Utc::now());
    }
}

/// Category and formats applied to every file added in one go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTemplate {
    pub category: Category,
    /// Source format; also restricts which files are accepted.
    pub source_format: Option<String>,
    pub target_format: String,
}

impl RequestTemplate {
    pub fn new(category: Category, source_format: Option<&str>, target_format: &str) -> Self {
        Self {
            category,
            source_format: source_format.map(str::to_string),
            target_format: target_format.to_string(),
        }
    }

    /// The request for one file.
    pub fn request_for(&self, file_path: &Path) -> ConversionRequest {
        ConversionRequest {
            file_path: file_path.to_path_buf(),
            category: self.category,
            source_format: self.source_format.clone(),
            target_format: self.target_format.clone(),
        }
    }
}

/// Why a picked file was not added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The file's extension does not match the selected source format.
    ExtensionMismatch { expected: Vec<String> },
    /// The file exceeds the service's upload limit.
    TooLarge { size: u64, limit: u64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExtensionMismatch { expected } => {
                write!(f, "expected one of {}", expected.join(", "))
            }
            SkipReason::TooLarge { size, limit } => {
                write!(f, "{size} bytes exceeds the {limit} byte limit")
            }
        }
    }
}

/// A picked file that was not added to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub name: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of adding picked files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddFilesOutcome {
    /// Ids of the items created, in pick order.
    pub added: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

/// Run-level progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Items that reached success or error in this run.
    pub done: usize,
    /// Items that were pending when the run started, minus removed ones.
    pub total: usize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self { done: 0, total }
    }

    /// Rounded percentage of `done` over `total`; 100 for an empty run.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let done = self.done.min(self.total);
        ((done * 100 + self.total / 2) / self.total) as u8
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Whether the run stopped early because of a cancel request.
    pub cancelled: bool,
}

/// Events published while a batch changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    ItemAdded { item: BatchItem },
    ItemRemoved { id: String },
    Started { total: usize },
    ItemUpdated { item: BatchItem },
    /// Advisory per-item progress while the task is polled.
    ItemProgress { id: String, percent: u8 },
    ItemFailed { id: String, name: String, message: String },
    Progress { done: usize, total: usize, percent: u8 },
    Completed { summary: BatchSummary },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> BatchItem {
        BatchItem::new(
            ConversionRequest::document("/in/a.pdf", "pdf", "docx"),
            "a.pdf",
            1024,
        )
    }

    #[test]
    fn test_new_item_is_pending() {
        let item = item();
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(item.result_url.is_none());
        assert!(item.error.is_none());
        assert!(Uuid::parse_str(&item.id).is_ok());
    }

    #[test]
    fn test_result_url_only_on_success() {
        let mut item = item();
        item.begin();
        assert_eq!(item.status, ItemStatus::Processing);
        item.succeed("https://x/public/a.docx".to_string());
        assert_eq!(item.status, ItemStatus::Success);
        assert!(item.result_url.is_some());

        item.begin();
        assert!(item.result_url.is_none());
        item.fail("boom".to_string());
        assert_eq!(item.status, ItemStatus::Error);
        assert!(item.result_url.is_none());
        assert_eq!(item.error.as_deref(), Some("boom"));
        assert!(item.finished_at.is_some());
    }

    #[test]
    fn test_template_request() {
        let template = RequestTemplate::new(Category::Audio, Some("wav"), "mp3");
        let request = template.request_for(Path::new("/in/song.wav"));
        assert_eq!(request.category, Category::Audio);
        assert_eq!(request.target_format, "mp3");
        assert_eq!(request.file_path(), Path::new("/in/song.wav"));
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(BatchProgress { done: 1, total: 3 }.percent(), 33);
        assert_eq!(BatchProgress { done: 2, total: 3 }.percent(), 67);
        assert_eq!(BatchProgress { done: 3, total: 3 }.percent(), 100);
        assert_eq!(BatchProgress::new(0).percent(), 100);
    }

    #[test]
    fn test_event_serialization() {
        let event = BatchEvent::Progress {
            done: 1,
            total: 2,
            percent: 50,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["percent"], 50);
    }

    #[test]
    fn test_skip_reason_serialization() {
        let skipped = SkippedFile {
            name: "big.wav".to_string(),
            reason: SkipReason::TooLarge { size: 10, limit: 5 },
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["reason"], "too_large");
        assert_eq!(json["limit"], 5);
    }

    #[test]
    fn test_error_display() {
        let err = BatchError::InvalidState {
            expected: "error".to_string(),
            actual: "success".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid item state: expected error, got success"
        );
    }
}
