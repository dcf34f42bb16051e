//! Prometheus metrics for the command-line host.
//!
//! Registers the core collectors alongside per-command counters and renders
//! them in text exposition format for `--metrics`.

use once_cell::sync::Lazy;
use prometheus::{self, Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Commands run, by name and outcome.
pub static COMMANDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("convertease_cli_commands_total", "Commands run by the CLI"),
        &["command", "result"], // result: "success", "error"
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(COMMANDS_TOTAL.clone())).unwrap();

    // Core metrics (submission, polling, transport, batches)
    for metric in convertease_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_core_metrics() {
        COMMANDS_TOTAL
            .with_label_values(&["normalize", "success"])
            .inc();
        convertease_core::metrics::TASK_POLLS.inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("convertease_cli_commands_total"));
        assert!(text.contains("convertease_task_polls_total"));
    }
}
