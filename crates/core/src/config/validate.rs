use super::{types::ForgeConfig, ConfigError};

/// Validate configuration
/// Currently validates:
/// - batch.max_concurrency is at least 1
/// - defaults.quality is within 0..=100
/// - timeout_secs is not 0
pub fn validate_config(config: &ForgeConfig) -> Result<(), ConfigError> {
    if config.batch.max_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "batch.max_concurrency must be at least 1".to_string(),
        ));
    }

    if config.defaults.quality > 100 {
        return Err(ConfigError::ValidationError(format!(
            "defaults.quality must be between 0 and 100, got {}",
            config.defaults.quality
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&ForgeConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = ForgeConfig::default();
        config.batch.max_concurrency = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_quality_out_of_range_fails() {
        let mut config = ForgeConfig::default();
        config.defaults.quality = 101;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = ForgeConfig::default();
        config.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
