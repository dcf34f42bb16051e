//! Bounded polling of a remote task until it reaches a terminal state.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::ConversionError;
use crate::metrics;

use super::config::PollConfig;
use super::types::{TaskState, TaskStatus};

/// Lower bound of the synthetic progress signal.
pub const MIN_PROGRESS: u8 = 5;
/// Upper bound of the synthetic progress signal before completion.
pub const MAX_PROGRESS: u8 = 90;
/// Percentage points added per whole elapsed second.
const PROGRESS_PER_SECOND: u64 = 3;

/// Advisory progress for a task that has been running for `elapsed`.
///
/// The service reports no real percentage; this only keeps a UI moving.
/// The value never decreases as `elapsed` grows and stays within
/// [`MIN_PROGRESS`, `MAX_PROGRESS`].
pub fn estimate_progress(elapsed: Duration) -> u8 {
    let raw = elapsed.as_secs().saturating_mul(PROGRESS_PER_SECOND);
    raw.clamp(MIN_PROGRESS as u64, MAX_PROGRESS as u64) as u8
}

/// Outcome of a task that finished successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTask {
    /// Result URL exactly as reported by the service (not normalized).
    pub result_url: String,
    /// Number of status queries issued.
    pub polls: u32,
    pub elapsed: Duration,
}

/// Drives a single task to completion with a fixed polling interval.
#[derive(Debug, Clone, Default)]
pub struct TaskPoller {
    config: PollConfig,
}

impl TaskPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Query `task_id` until it finishes, fails, or the deadline passes.
    ///
    /// Errors returned by `query` end the loop immediately and are passed
    /// through unchanged. `on_progress` receives the advisory estimate after
    /// every query.
    pub async fn poll_until_complete<Q, Fut, P>(
        &self,
        task_id: &str,
        mut query: Q,
        mut on_progress: P,
    ) -> Result<CompletedTask, ConversionError>
    where
        Q: FnMut(&str) -> Fut,
        Fut: Future<Output = Result<TaskStatus, ConversionError>>,
        P: FnMut(u8),
    {
        let start = Instant::now();
        let timeout = self.config.timeout();
        let interval = self.config.interval();
        let mut polls = 0u32;

        while start.elapsed() < timeout {
            let status = match query(task_id).await {
                Ok(status) => status,
                Err(e) => {
                    metrics::TASK_OUTCOMES.with_label_values(&[e.kind()]).inc();
                    return Err(e);
                }
            };
            polls += 1;
            metrics::TASK_POLLS.inc();

            let elapsed = start.elapsed();
            on_progress(estimate_progress(elapsed));

            debug!(
                task_id = %task_id,
                state = status.state.as_str(),
                polls,
                "Task status"
            );

            match status.state {
                TaskState::Finished => {
                    let Some(url) = status.result_url() else {
                        metrics::TASK_OUTCOMES
                            .with_label_values(&["protocol"])
                            .inc();
                        return Err(ConversionError::protocol(
                            "task finished but no result url",
                        ));
                    };
                    info!(task_id = %task_id, polls, url = %url, "Task finished");
                    metrics::TASK_OUTCOMES.with_label_values(&["success"]).inc();
                    metrics::TASK_DURATION.observe(elapsed.as_secs_f64());
                    return Ok(CompletedTask {
                        result_url: url.to_string(),
                        polls,
                        elapsed,
                    });
                }
                TaskState::Error => {
                    let err = ConversionError::task(status.message.as_deref());
                    warn!(task_id = %task_id, error = %err, "Task failed on the service");
                    metrics::TASK_OUTCOMES.with_label_values(&["task"]).inc();
                    return Err(err);
                }
                TaskState::Queued | TaskState::Processing => {
                    tokio::time::sleep(interval).await;
                }
            }
        }

        warn!(
            task_id = %task_id,
            polls,
            timeout_ms = self.config.timeout_ms,
            "Task did not finish before the deadline"
        );
        metrics::TASK_OUTCOMES.with_label_values(&["timeout"]).inc();
        Err(ConversionError::Timeout {
            timeout_ms: self.config.timeout_ms,
        })
    }
}
