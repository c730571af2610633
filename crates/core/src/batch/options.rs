//! Options for batch conversions.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::BatchError;
use super::observer::BatchObserver;
use crate::config::ForgeConfig;
use crate::engine::ConversionOptions;

/// Conversion options plus batch scheduling controls.
#[derive(Clone, Serialize, Deserialize)]
pub struct BatchConversionOptions {
    /// Options applied to every file.
    #[serde(flatten)]
    pub conversion: ConversionOptions,

    /// Extra patterns expanded after the ones passed to `convert_batch`.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Maximum conversions in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Keep going after a hard error.
    #[serde(default = "default_continue_on_error")]
    pub continue_on_error: bool,

    /// Receives progress and error notifications.
    #[serde(skip)]
    pub observer: Option<Arc<dyn BatchObserver>>,
}

fn default_max_concurrency() -> usize {
    5
}

fn default_continue_on_error() -> bool {
    true
}

impl std::fmt::Debug for BatchConversionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchConversionOptions")
            .field("conversion", &self.conversion)
            .field("patterns", &self.patterns)
            .field("max_concurrency", &self.max_concurrency)
            .field("continue_on_error", &self.continue_on_error)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for BatchConversionOptions {
    fn default() -> Self {
        Self {
            conversion: ConversionOptions::default(),
            patterns: Vec::new(),
            max_concurrency: default_max_concurrency(),
            continue_on_error: default_continue_on_error(),
            observer: None,
        }
    }
}

impl BatchConversionOptions {
    /// Options seeded from the configured defaults.
    pub fn from_config(config: &ForgeConfig) -> Self {
        Self {
            conversion: ConversionOptions::from_config(config),
            max_concurrency: config.batch.max_concurrency,
            continue_on_error: config.batch.continue_on_error,
            ..Self::default()
        }
    }

    pub fn with_conversion(mut self, conversion: ConversionOptions) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.max_concurrency == 0 {
            return Err(BatchError::InvalidOptions(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CompressionLevel;

    #[test]
    fn test_defaults() {
        let options = BatchConversionOptions::default();
        assert_eq!(options.max_concurrency, 5);
        assert!(options.continue_on_error);
        assert!(options.observer.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_is_invalid() {
        let options = BatchConversionOptions::default().with_max_concurrency(0);
        assert!(matches!(options.validate(), Err(BatchError::InvalidOptions(_))));
    }

    #[test]
    fn test_from_config() {
        let mut config = ForgeConfig::default();
        config.batch.max_concurrency = 2;
        config.batch.continue_on_error = false;
        config.defaults.compression = CompressionLevel::Low;

        let options = BatchConversionOptions::from_config(&config);
        assert_eq!(options.max_concurrency, 2);
        assert!(!options.continue_on_error);
        assert_eq!(options.conversion.compression, CompressionLevel::Low);
    }

    #[test]
    fn test_deserialize_flattened() {
        let options: BatchConversionOptions = serde_json::from_str(
            r#"{"quality": 50, "max_concurrency": 3, "patterns": ["*.txt"]}"#,
        )
        .unwrap();
        assert_eq!(options.conversion.quality, 50);
        assert_eq!(options.max_concurrency, 3);
        assert_eq!(options.patterns, vec!["*.txt"]);
    }
}
