use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::CompressionLevel;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForgeConfig {
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default)]
    pub memory: MemoryMode,
    /// Upper bound for a single plugin invocation, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("fileforge")
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            memory: MemoryMode::default(),
            timeout_secs: default_timeout(),
            logging: LoggingConfig::default(),
            batch: BatchConfig::default(),
            defaults: DefaultsConfig::default(),
            plugins: PluginsConfig::default(),
        }
    }
}

impl ForgeConfig {
    /// Returns the plugin invocation timeout.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Memory usage profile, which drives the default I/O buffer size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMode {
    Low,
    #[default]
    Normal,
    High,
}

impl MemoryMode {
    /// Buffer size used for streamed reads when no explicit size is requested.
    pub fn buffer_size(&self) -> usize {
        match self {
            Self::Low => 64 * 1024,
            Self::Normal => 256 * 1024,
            Self::High => 1024 * 1024,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Batch defaults, overridable per call.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_continue_on_error")]
    pub continue_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            continue_on_error: default_continue_on_error(),
        }
    }
}

fn default_max_concurrency() -> usize {
    5
}

fn default_continue_on_error() -> bool {
    true
}

/// Default conversion settings applied when the caller does not set them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub compression: CompressionLevel,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::default(),
            quality: default_quality(),
            ocr_language: default_ocr_language(),
        }
    }
}

fn default_quality() -> u8 {
    85
}

fn default_ocr_language() -> String {
    "por".to_string()
}

/// Built-in plugin selection
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PluginsConfig {
    /// Names of built-in plugins that should not be registered.
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl PluginsConfig {
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d.eq_ignore_ascii_case(name))
    }
}
