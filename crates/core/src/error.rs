//! Error taxonomy shared by the transport, submission and polling layers.

use thiserror::Error;

/// Fallback message when the service reports a failed task without one.
pub const DEFAULT_TASK_FAILURE: &str = "conversion failed";

/// Errors produced while submitting or tracking a conversion task.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// No response was received (connection refused, DNS, timeout, reset).
    #[error("network error: {reason}")]
    Network { reason: String },

    /// The service answered with a status outside `200..300`.
    #[error("HTTP {status_code}: {message}")]
    Http { status_code: u16, message: String },

    /// A successful response was malformed or incomplete.
    #[error("protocol error: {reason}")]
    Protocol { reason: String },

    /// The service explicitly reported the task as failed.
    #[error("{message}")]
    Task { message: String },

    /// The task did not reach a terminal state before the deadline.
    #[error("conversion timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The local file could not be read for upload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Polling was stopped because the owning batch was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl ConversionError {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    pub fn http(status_code: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status_code,
            message: message.into(),
        }
    }

    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Creates a task failure, falling back to a generic message when the
    /// service supplied none.
    pub fn task(message: Option<&str>) -> Self {
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_TASK_FAILURE);
        Self::Task {
            message: message.to_string(),
        }
    }

    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Http { .. } => "http",
            Self::Protocol { .. } => "protocol",
            Self::Task { .. } => "task",
            Self::Timeout { .. } => "timeout",
            Self::Io(_) => "io",
            Self::Cancelled => "cancelled",
        }
    }

    /// HTTP status code, if the service answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}
