use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Base URL override, when set, is an http(s) URL
/// - Request timeout is not 0
/// - Polling interval and timeout are not 0, and interval <= timeout
/// - Event buffer and picker limit are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // API validation
    if let Some(url) = config.api.base_url.as_deref().map(str::trim) {
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must start with http:// or https://, got {url}"
            )));
        }
    }

    if config.api.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.request_timeout_secs cannot be 0".to_string(),
        ));
    }

    // Polling validation
    if config.polling.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "polling.interval_ms cannot be 0".to_string(),
        ));
    }

    if config.polling.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "polling.timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.polling.interval_ms > config.polling.timeout_ms {
        return Err(ConfigError::ValidationError(format!(
            "polling.interval_ms ({}) cannot exceed polling.timeout_ms ({})",
            config.polling.interval_ms, config.polling.timeout_ms
        )));
    }

    // Batch validation
    if config.batch.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "batch.event_buffer cannot be 0".to_string(),
        ));
    }

    if config.batch.max_selection == 0 {
        return Err(ConfigError::ValidationError(
            "batch.max_selection cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_override_scheme() {
        let config = Config {
            api: ApiConfig {
                base_url: Some("ftp://convertease.site".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_override_is_fallback() {
        let config = Config {
            api: ApiConfig {
                base_url: Some(String::new()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let mut config = Config::default();
        config.polling.interval_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("polling.interval_ms"));
    }

    #[test]
    fn test_validate_interval_exceeding_timeout_fails() {
        let mut config = Config::default();
        config.polling.interval_ms = 10_000;
        config.polling.timeout_ms = 5_000;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_event_buffer_fails() {
        let mut config = Config::default();
        config.batch.event_buffer = 0;
        assert!(validate_config(&config).is_err());
    }
}
