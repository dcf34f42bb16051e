use serde::{Deserialize, Serialize};

use crate::batch::BatchConfig;
use crate::task::PollConfig;

/// Fixed production origin of the conversion service.
pub const PRODUCTION_BASE_URL: &str = "https://convertease.site";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Remote service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL override (e.g., "http://localhost:8000"). Falls back to
    /// the production origin when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// The base URL every endpoint is built from.
    pub fn resolved_base_url(&self) -> String {
        resolve_base_url(self.base_url.as_deref())
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("ConvertEase/{}", env!("CARGO_PKG_VERSION"))
}

/// Resolve the service base URL from an optional override.
///
/// A single trailing slash is stripped; an absent or blank override yields
/// [`PRODUCTION_BASE_URL`].
pub fn resolve_base_url(override_url: Option<&str>) -> String {
    match override_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => url.strip_suffix('/').unwrap_or(url).to_string(),
        None => PRODUCTION_BASE_URL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_base_url_fallback() {
        assert_eq!(resolve_base_url(None), PRODUCTION_BASE_URL);
        assert_eq!(resolve_base_url(Some("")), PRODUCTION_BASE_URL);
    }

    #[test]
    fn test_resolve_base_url_strips_trailing_slash() {
        assert_eq!(
            resolve_base_url(Some("https://custom.api.com/")),
            "https://custom.api.com"
        );
        assert_eq!(
            resolve_base_url(Some("https://custom.api.com")),
            "https://custom.api.com"
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.api.base_url.is_none());
        assert_eq!(config.api.request_timeout_secs, 30);
        assert!(config.api.user_agent.starts_with("ConvertEase/"));
        assert_eq!(config.polling.timeout_ms, 300_000);
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.api.resolved_base_url(), PRODUCTION_BASE_URL);
    }

    #[test]
    fn test_deserialize_api_section() {
        let toml = r#"
[api]
base_url = "http://localhost:8000/"
request_timeout_secs = 10
user_agent = "test-agent"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.request_timeout_secs, 10);
        assert_eq!(config.api.user_agent, "test-agent");
        assert_eq!(config.api.resolved_base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_serialize_skips_missing_override() {
        let json = serde_json::to_value(ApiConfig::default()).unwrap();
        assert!(json.get("base_url").is_none());
        assert_eq!(json["request_timeout_secs"], 30);
    }
}
