//! Mock host operations for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::files::SelectedFile;
use crate::host::{FileSelector, HostError, ResultDownloader};

/// A recorded picker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSelection {
    pub allowed_extensions: Vec<String>,
    pub max: usize,
}

/// Mock implementation of the FileSelector trait.
///
/// Returns the configured files (at most `max` of them) or a cancellation
/// when the user is simulated dismissing the picker.
#[derive(Debug, Clone, Default)]
pub struct MockFileSelector {
    files: Arc<RwLock<Vec<SelectedFile>>>,
    dismissed: Arc<RwLock<bool>>,
    selections: Arc<RwLock<Vec<RecordedSelection>>>,
}

impl MockFileSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_files(&self, files: Vec<SelectedFile>) {
        *self.files.write().await = files;
    }

    /// Simulate the user dismissing the picker.
    pub async fn set_dismissed(&self, dismissed: bool) {
        *self.dismissed.write().await = dismissed;
    }

    pub async fn recorded_selections(&self) -> Vec<RecordedSelection> {
        self.selections.read().await.clone()
    }
}

#[async_trait]
impl FileSelector for MockFileSelector {
    async fn choose_files(
        &self,
        allowed_extensions: &[String],
        max: usize,
    ) -> Result<Vec<SelectedFile>, HostError> {
        self.selections.write().await.push(RecordedSelection {
            allowed_extensions: allowed_extensions.to_vec(),
            max,
        });

        if *self.dismissed.read().await {
            return Err(HostError::Cancelled);
        }

        Ok(self.files.read().await.iter().take(max).cloned().collect())
    }
}

/// Mock implementation of the ResultDownloader trait.
///
/// Records requested URLs and reports a path under a fake download
/// directory named after the last URL segment.
#[derive(Debug, Clone, Default)]
pub struct MockDownloader {
    downloads: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<String>>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next download fail with `message`.
    pub async fn fail_next(&self, message: &str) {
        *self.next_error.write().await = Some(message.to_string());
    }

    pub async fn downloaded_urls(&self) -> Vec<String> {
        self.downloads.read().await.clone()
    }
}

#[async_trait]
impl ResultDownloader for MockDownloader {
    async fn download(&self, url: &str) -> Result<PathBuf, HostError> {
        if let Some(message) = self.next_error.write().await.take() {
            return Err(HostError::Failed(message));
        }

        self.downloads.write().await.push(url.to_string());
        let name = url.rsplit('/').next().unwrap_or("download");
        Ok(PathBuf::from("/downloads").join(name))
    }
}
