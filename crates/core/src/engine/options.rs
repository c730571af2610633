//! Per-call conversion options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::error::EngineError;
use crate::config::ForgeConfig;

/// Option bag for format-specific settings.
pub type OptionBag = Map<String, Value>;

/// Compression effort requested from plugins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    None,
    Low,
    #[default]
    Medium,
    High,
    Maximum,
}

impl CompressionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Maximum => "maximum",
        }
    }
}

impl std::fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "maximum" | "max" => Ok(Self::Maximum),
            other => Err(format!("unknown compression level: {other}")),
        }
    }
}

/// Options for a single conversion. Treated as immutable for the duration of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Target format. The engine overwrites this with the format passed to `convert`.
    #[serde(default)]
    pub output_format: Option<String>,

    /// Directory for the persisted output. Setting this (or `output_name`) enables persistence.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// File name for the persisted output.
    #[serde(default)]
    pub output_name: Option<String>,

    #[serde(default)]
    pub compression: CompressionLevel,

    /// Output quality, 0-100.
    #[serde(default = "default_quality")]
    pub quality: u8,

    #[serde(default)]
    pub ocr: bool,

    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,

    /// Extract metadata from the input before converting.
    #[serde(default)]
    pub metadata: bool,

    /// Read path inputs through a buffered reader of `buffer_size` bytes.
    #[serde(default)]
    pub streaming: bool,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default)]
    pub format_options: OptionBag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<OptionBag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<OptionBag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<OptionBag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai: Option<OptionBag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<OptionBag>,

    #[serde(default)]
    pub debug: bool,

    /// Pin the conversion to the plugin with this name.
    #[serde(default)]
    pub plugin: Option<String>,
}

fn default_quality() -> u8 {
    85
}

fn default_ocr_language() -> String {
    "por".to_string()
}

fn default_buffer_size() -> usize {
    256 * 1024 // 256 KiB
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            output_format: None,
            output_dir: None,
            output_name: None,
            compression: CompressionLevel::default(),
            quality: default_quality(),
            ocr: false,
            ocr_language: default_ocr_language(),
            metadata: false,
            streaming: false,
            buffer_size: default_buffer_size(),
            format_options: OptionBag::new(),
            image: None,
            video: None,
            audio: None,
            ai: None,
            tts: None,
            debug: false,
            plugin: None,
        }
    }
}

impl ConversionOptions {
    /// Options seeded from the configured defaults.
    pub fn from_config(config: &ForgeConfig) -> Self {
        Self {
            compression: config.defaults.compression,
            quality: config.defaults.quality,
            ocr_language: config.defaults.ocr_language.clone(),
            buffer_size: config.memory.buffer_size(),
            ..Self::default()
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn with_compression(mut self, compression: CompressionLevel) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_streaming(mut self, buffer_size: usize) -> Self {
        self.streaming = true;
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_plugin(mut self, name: impl Into<String>) -> Self {
        self.plugin = Some(name.into());
        self
    }

    /// Sets one entry in the image option bag.
    pub fn with_image_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.image
            .get_or_insert_with(OptionBag::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether the output should be written to disk.
    pub fn wants_persistence(&self) -> bool {
        self.output_dir.is_some() || self.output_name.is_some()
    }

    /// Looks up an image option, falling back to `format_options`.
    pub fn image_option(&self, key: &str) -> Option<&Value> {
        self.image
            .as_ref()
            .and_then(|bag| bag.get(key))
            .or_else(|| self.format_options.get(key))
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.quality > 100 {
            return Err(EngineError::invalid_options(format!(
                "quality must be within 0-100, got {}",
                self.quality
            )));
        }
        if self.buffer_size == 0 {
            return Err(EngineError::invalid_options("buffer_size must be positive"));
        }
        if matches!(&self.output_name, Some(name) if name.trim().is_empty()) {
            return Err(EngineError::invalid_options("output_name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConversionOptions::default();
        assert_eq!(options.compression, CompressionLevel::Medium);
        assert_eq!(options.quality, 85);
        assert_eq!(options.ocr_language, "por");
        assert_eq!(options.buffer_size, 256 * 1024);
        assert!(!options.wants_persistence());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_config() {
        let mut config = ForgeConfig::default();
        config.defaults.quality = 60;
        config.defaults.compression = CompressionLevel::High;
        config.memory = crate::config::MemoryMode::Low;

        let options = ConversionOptions::from_config(&config);
        assert_eq!(options.quality, 60);
        assert_eq!(options.compression, CompressionLevel::High);
        assert_eq!(options.buffer_size, 64 * 1024);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let options = ConversionOptions::default().with_quality(101);
        assert!(options.validate().is_err());

        let options = ConversionOptions {
            buffer_size: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = ConversionOptions::default().with_output_name("  ");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_compression_parsing() {
        assert_eq!("NONE".parse::<CompressionLevel>().unwrap(), CompressionLevel::None);
        assert_eq!("max".parse::<CompressionLevel>().unwrap(), CompressionLevel::Maximum);
        assert!("extreme".parse::<CompressionLevel>().is_err());
    }

    #[test]
    fn test_image_option_falls_back_to_format_options() {
        let mut options = ConversionOptions::default().with_image_option("rotate", 90);
        options
            .format_options
            .insert("resize".to_string(), Value::from("10x10"));

        assert_eq!(options.image_option("rotate"), Some(&Value::from(90)));
        assert_eq!(options.image_option("resize"), Some(&Value::from("10x10")));
        assert_eq!(options.image_option("flip"), None);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: ConversionOptions =
            serde_json::from_str(r#"{"compression": "none", "quality": 10}"#).unwrap();
        assert_eq!(options.compression, CompressionLevel::None);
        assert_eq!(options.quality, 10);
        assert_eq!(options.ocr_language, "por");
    }
}
