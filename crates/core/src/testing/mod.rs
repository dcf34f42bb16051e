//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the service, transport and
//! host traits so the batch flow can be exercised without a running
//! conversion service.
//!
//! # Example
//!
//! ```rust,ignore
//! use convertease_core::testing::{MockConversionService, fixtures};
//!
//! let service = MockConversionService::new();
//! service.set_status_script("/in/report.pdf", vec![
//!     TaskStatus::processing(),
//!     TaskStatus::finished("http://localhost:8000/download/report.docx"),
//! ]).await;
//!
//! // Hand it to a BatchOrchestrator...
//! ```

mod mock_host;
mod mock_service;
mod mock_transport;

pub use mock_host::{MockDownloader, MockFileSelector, RecordedSelection};
pub use mock_service::{MockConversionService, MockFailure, MOCK_RESULT_ORIGIN};
pub use mock_transport::{MockResponse, MockTransport, RecordedRequest};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::PathBuf;

    use serde_json::{json, Value};

    use crate::batch::RequestTemplate;
    use crate::files::SelectedFile;
    use crate::task::Category;

    /// A selected file under `/in` with the given name and size.
    pub fn selected_file(name: &str, size: u64) -> SelectedFile {
        SelectedFile::new(PathBuf::from("/in").join(name), name, size)
    }

    /// Template converting documents from `source` to `target`.
    pub fn document_template(source: &str, target: &str) -> RequestTemplate {
        RequestTemplate::new(Category::Document, Some(source), target)
    }

    /// Template converting audio to `target`, filtering picks by `source`.
    pub fn audio_template(source: &str, target: &str) -> RequestTemplate {
        RequestTemplate::new(Category::Audio, Some(source), target)
    }

    /// A `/supported-formats` body for one category.
    pub fn supported_formats_body(category: Category, conversions: Value) -> Value {
        let mut body = serde_json::Map::new();
        body.insert(
            category.as_str().to_string(),
            json!({ "supportedConversions": conversions }),
        );
        Value::Object(body)
    }

    /// A `/health` body reporting `ok`.
    pub fn health_body(ok: bool) -> Value {
        json!({
            "ok": ok,
            "timestamp": "2026-01-01T00:00:00.000Z",
            "service": "convertease",
            "version": "1.0.0"
        })
    }
}
