//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Submission (uploads by category and result)
//! - Polling (status queries, task outcomes, task duration)
//! - Transport (HTTP requests by operation and status)
//! - Batches (items by final result)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Submission Metrics
// =============================================================================

/// Task submissions total by category and result.
pub static TASKS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "convertease_tasks_submitted_total",
            "Total conversion task submissions",
        ),
        &["category", "result"], // result: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Polling Metrics
// =============================================================================

/// Status queries issued by the polling engine.
pub static TASK_POLLS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("convertease_task_polls_total", "Total task status queries").unwrap()
});

/// Tasks that left the polling loop, by outcome.
pub static TASK_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "convertease_task_outcomes_total",
            "Polling loop exits by outcome",
        ),
        &["result"], // "success", "task", "timeout", "protocol", "network", "http", ...
    )
    .unwrap()
});

/// Time from first status query to a finished task, in seconds.
pub static TASK_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "convertease_task_duration_seconds",
            "Duration of successfully finished tasks",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
    )
    .unwrap()
});

// =============================================================================
// Transport Metrics
// =============================================================================

/// HTTP requests total by operation and status.
pub static HTTP_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "convertease_http_requests_total",
            "Total HTTP requests to the conversion service",
        ),
        &["operation", "status"], // operation: "send", "upload"; status: code or "network"
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batch items that reached a final state, by result.
pub static BATCH_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("convertease_batch_items_total", "Batch items by final result"),
        &["result"], // "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TASKS_SUBMITTED.clone()),
        Box::new(TASK_POLLS.clone()),
        Box::new(TASK_OUTCOMES.clone()),
        Box::new(TASK_DURATION.clone()),
        Box::new(HTTP_REQUESTS.clone()),
        Box::new(BATCH_ITEMS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        TASK_POLLS.inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"convertease_task_polls_total".to_string()));
    }
}
