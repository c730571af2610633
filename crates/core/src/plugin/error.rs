//! Error types for plugins.

use thiserror::Error;

/// Errors a plugin may raise from any of its operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin does not handle this input format.
    #[error("Unsupported input format: {format}")]
    UnsupportedInput { format: String },

    /// The plugin does not produce this output format.
    #[error("Unsupported output format: {format}")]
    UnsupportedOutput { format: String },

    /// The input could not be decoded.
    #[error("Failed to decode {format} input: {reason}")]
    Decode { format: String, reason: String },

    /// The output could not be encoded.
    #[error("Failed to encode {format} output: {reason}")]
    Encode { format: String, reason: String },

    /// An option value is malformed.
    #[error("Invalid option {option}: {reason}")]
    InvalidOption { option: String, reason: String },

    /// The plugin does not implement metadata extraction.
    #[error("Plugin {plugin} does not support metadata extraction")]
    MetadataUnsupported { plugin: String },

    /// Initialization or cleanup failed.
    #[error("Plugin lifecycle failure: {0}")]
    Lifecycle(String),

    /// I/O error inside the plugin.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl PluginError {
    /// Creates a new decode error.
    pub fn decode(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new encode error.
    pub fn encode(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encode {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new invalid option error.
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PluginError::decode("png", "bad header");
        assert_eq!(err.to_string(), "Failed to decode png input: bad header");

        let err = PluginError::invalid_option("resize", "expected WxH");
        assert_eq!(err.to_string(), "Invalid option resize: expected WxH");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PluginError = io.into();
        assert!(matches!(err, PluginError::Io(_)));
    }
}
