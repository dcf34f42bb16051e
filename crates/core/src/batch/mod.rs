//! Batch orchestrator for sequential multi-file conversion.
//!
//! The orchestrator owns the ordered item list of one session. A run walks
//! the items that were `pending` when it started, one at a time:
//! submit, poll to a terminal state, normalize the result URL, record the
//! outcome. Failures are recorded on the item and never stop the batch.

mod config;
mod runner;
mod types;

pub use config::BatchConfig;
pub use runner::BatchOrchestrator;
pub use types::{
    AddFilesOutcome, BatchError, BatchEvent, BatchItem, BatchProgress, BatchSummary, ItemStatus,
    RequestTemplate, SkipReason, SkippedFile,
};
