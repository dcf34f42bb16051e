//! Conversion task model and the polling engine.
//!
//! A task is created by uploading a file (see [`crate::service`]) and then
//! tracked through `queued -> processing -> finished | error` by
//! [`TaskPoller`], which issues one status query per interval until a
//! terminal state or the deadline.

mod config;
mod poller;
mod types;

pub use config::PollConfig;
pub use poller::{estimate_progress, CompletedTask, TaskPoller, MAX_PROGRESS, MIN_PROGRESS};
pub use types::{Category, ConversionRequest, TaskHandle, TaskState, TaskStatus};
