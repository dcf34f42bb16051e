//! Types describing conversion requests and remote task state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Conversion category understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Document,
    Audio,
    Image,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Document, Category::Audio, Category::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Audio => "audio",
            Category::Image => "image",
        }
    }

    /// Whether the upload form carries the source format.
    pub fn sends_source(&self) -> bool {
        matches!(self, Category::Document)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(Category::Document),
            "audio" => Ok(Category::Audio),
            "image" => Ok(Category::Image),
            other => Err(format!(
                "unknown category '{other}' (expected document, audio or image)"
            )),
        }
    }
}

/// A single file conversion to submit.
///
/// Built once when the file is selected and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub file_path: PathBuf,
    pub category: Category,
    /// Source format; only sent to the service for documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_format: Option<String>,
    pub target_format: String,
}

impl ConversionRequest {
    pub fn document(
        file_path: impl Into<PathBuf>,
        source_format: impl Into<String>,
        target_format: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            category: Category::Document,
            source_format: Some(source_format.into()),
            target_format: target_format.into(),
        }
    }

    pub fn audio(file_path: impl Into<PathBuf>, target_format: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            category: Category::Audio,
            source_format: None,
            target_format: target_format.into(),
        }
    }

    pub fn image(file_path: impl Into<PathBuf>, target_format: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            category: Category::Image,
            source_format: None,
            target_format: target_format.into(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Multipart text fields for the upload endpoint.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("category", self.category.as_str().to_string()),
            ("target", self.target_format.clone()),
        ];
        if self.category.sends_source() {
            if let Some(source) = &self.source_format {
                fields.push(("source", source.clone()));
            }
        }
        fields
    }
}

/// Opaque identifier of a server-side task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHandle {
    pub task_id: String,
}

impl TaskHandle {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.task_id
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.task_id)
    }
}

/// Remote task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Queued,
    Processing,
    Finished,
    Error,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Finished | TaskState::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Queued => "queued",
            TaskState::Processing => "processing",
            TaskState::Finished => "finished",
            TaskState::Error => "error",
        }
    }
}

/// Task status as reported by `GET /convert/task/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Legacy name of the result URL.
    #[serde(
        default,
        rename = "downloadUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskStatus {
    fn with_state(state: TaskState) -> Self {
        Self {
            state,
            url: None,
            download_url: None,
            message: None,
        }
    }

    pub fn queued() -> Self {
        Self::with_state(TaskState::Queued)
    }

    pub fn processing() -> Self {
        Self::with_state(TaskState::Processing)
    }

    pub fn finished(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::with_state(TaskState::Finished)
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_state(TaskState::Error)
        }
    }

    /// Result URL, checking the primary field before the legacy one.
    pub fn result_url(&self) -> Option<&str> {
        [self.url.as_deref(), self.download_url.as_deref()]
            .into_iter()
            .flatten()
            .find(|u| !u.trim().is_empty())
    }
}
