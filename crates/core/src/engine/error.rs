//! Error types for the conversion engine.

use thiserror::Error;

use crate::format::DetectError;
use crate::plugin::PluginError;

/// Expected failures of a single conversion.
///
/// These never escape `ConversionEngine::convert`; they are rendered into
/// `ConversionResult::errors`.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// No registered plugin reads the detected input format.
    #[error("Unsupported input format: {format}")]
    UnsupportedInputFormat { format: String },

    /// No registered plugin writes the requested output format.
    #[error("Unsupported output format: {format}")]
    UnsupportedOutputFormat { format: String },

    /// The input format could not be detected.
    #[error("Unable to detect input format")]
    UnknownFormat,

    /// No plugin converts between the two formats.
    #[error("No plugin found for conversion {input} -> {output}")]
    NoPluginFound { input: String, output: String },

    /// The plugin rejected the options.
    #[error("Plugin {plugin} rejected the conversion options")]
    InvalidPluginOptions { plugin: String },

    /// The plugin raised an error.
    #[error("Plugin {plugin} failed: {source}")]
    PluginConversion {
        plugin: String,
        #[source]
        source: PluginError,
    },

    /// The plugin did not finish in time.
    #[error("Plugin {plugin} timed out after {timeout_secs} seconds")]
    Timeout { plugin: String, timeout_secs: u64 },

    /// Reading the input or writing the output failed.
    #[error("I/O failure while {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ConversionError {
    /// Creates a new I/O failure.
    pub fn io(action: &'static str, source: std::io::Error) -> Self {
        Self::Io { action, source }
    }

    /// Stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedInputFormat { .. } => "unsupported_input_format",
            Self::UnsupportedOutputFormat { .. } => "unsupported_output_format",
            Self::UnknownFormat => "unknown_format",
            Self::NoPluginFound { .. } => "no_plugin_found",
            Self::InvalidPluginOptions { .. } => "invalid_plugin_options",
            Self::PluginConversion { .. } => "plugin_conversion_error",
            Self::Timeout { .. } => "timeout",
            Self::Io { .. } => "io_failure",
        }
    }
}

impl From<DetectError> for ConversionError {
    fn from(err: DetectError) -> Self {
        match err {
            DetectError::UnknownFormat => Self::UnknownFormat,
        }
    }
}

/// Contract violations: the call itself was malformed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid conversion options: {reason}")]
    InvalidOptions { reason: String },
}

impl EngineError {
    /// Creates a new invalid options error.
    pub fn invalid_options(reason: impl Into<String>) -> Self {
        Self::InvalidOptions {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ConversionError::NoPluginFound {
            input: "pdf".to_string(),
            output: "docx".to_string(),
        };
        assert_eq!(err.to_string(), "No plugin found for conversion pdf -> docx");
        assert_eq!(err.kind(), "no_plugin_found");

        let err = ConversionError::PluginConversion {
            plugin: "text".to_string(),
            source: PluginError::decode("csv", "ragged row"),
        };
        assert_eq!(
            err.to_string(),
            "Plugin text failed: Failed to decode csv input: ragged row"
        );
    }

    #[test]
    fn test_from_detect_error() {
        let err: ConversionError = DetectError::UnknownFormat.into();
        assert!(matches!(err, ConversionError::UnknownFormat));
        assert_eq!(err.kind(), "unknown_format");
    }

    #[test]
    fn test_io_kind() {
        let err = ConversionError::io(
            "reading input",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.kind(), "io_failure");
        assert!(err.to_string().contains("reading input"));
    }
}
