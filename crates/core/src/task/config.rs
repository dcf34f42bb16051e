//! Polling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the task polling loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Deadline for a task to reach a terminal state (milliseconds).
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Fixed wait between two status queries (milliseconds).
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
}

fn default_timeout() -> u64 {
    300_000 // 5 minutes
}

fn default_interval() -> u64 {
    1000
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout(),
            interval_ms: default_interval(),
        }
    }
}

impl PollConfig {
    pub fn new(timeout_ms: u64, interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            interval_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.timeout_ms, 300_000);
        assert_eq!(config.interval_ms, 1000);
        assert_eq!(config.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PollConfig = toml::from_str("interval_ms = 250").unwrap();
        assert_eq!(config.interval_ms, 250);
        assert_eq!(config.timeout_ms, 300_000);
    }
}
