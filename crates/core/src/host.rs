//! Operations supplied by the hosting application.
//!
//! The core never opens file pickers or writes downloads itself; it asks
//! the host through these traits.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::files::SelectedFile;

/// Errors reported by host operations.
#[derive(Debug, Error)]
pub enum HostError {
    /// The user dismissed the picker.
    #[error("selection cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),
}

/// Lets the user pick local files.
#[async_trait]
pub trait FileSelector: Send + Sync {
    /// Choose up to `max` files, preferring the given dot-prefixed
    /// extensions (empty means any).
    async fn choose_files(
        &self,
        allowed_extensions: &[String],
        max: usize,
    ) -> Result<Vec<SelectedFile>, HostError>;
}

/// Fetches a result URL into a local file.
#[async_trait]
pub trait ResultDownloader: Send + Sync {
    /// Download `url` and return the local path of the bytes.
    async fn download(&self, url: &str) -> Result<PathBuf, HostError>;
}
