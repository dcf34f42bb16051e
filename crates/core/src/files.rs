//! Files picked by the host for conversion.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Upload size limit enforced by the service.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// A file chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
        }
    }

    /// Build from a path, using its basename as display name.
    pub fn from_path(path: impl AsRef<Path>, size: u64) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(path, name, size)
    }

    /// Dot-prefixed, lower-cased extension of the display name.
    pub fn extension(&self) -> String {
        file_extension(&self.name)
    }

    pub fn size_label(&self) -> String {
        format_size(self.size)
    }
}

/// Dot-prefixed, lower-cased extension of `name`, or empty if it has none.
pub fn file_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(i) => name[i..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Human readable size: `B` below 1 KiB, then `KB` and `MB` with one decimal.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
