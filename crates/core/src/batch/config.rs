//! Batch orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the batch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Capacity of the event channel.
    /// Slow subscribers lose the oldest events once it is full.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Maximum number of files taken from one picker invocation.
    #[serde(default = "default_max_selection")]
    pub max_selection: usize,
}

fn default_event_buffer() -> usize {
    64
}

fn default_max_selection() -> usize {
    9
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
            max_selection: default_max_selection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BatchConfig::default();
        assert_eq!(config.event_buffer, 64);
        assert_eq!(config.max_selection, 9);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: BatchConfig = toml::from_str("max_selection = 3").unwrap();
        assert_eq!(config.event_buffer, 64);
        assert_eq!(config.max_selection, 3);
    }
}
