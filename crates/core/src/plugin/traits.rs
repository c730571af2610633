//! Trait definitions for the plugin module.

use async_trait::async_trait;

use super::error::PluginError;
use super::types::{PluginInfo, PluginInput, PluginOutput};
use crate::engine::ConversionOptions;
use crate::metadata::MetadataResult;

/// A capability provider that converts between declared formats.
///
/// Format tokens returned by `input_formats`/`output_formats` must be lowercase
/// and without a leading dot.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Returns the unique name of this plugin.
    fn name(&self) -> &str;

    /// Returns the plugin version.
    fn version(&self) -> &str;

    /// Returns the formats this plugin can read.
    fn input_formats(&self) -> &[String];

    /// Returns the formats this plugin can write.
    fn output_formats(&self) -> &[String];

    /// Converts the input into the format named by `options.output_format`.
    ///
    /// The engine drops this future when the conversion timeout elapses.
    /// Work handed to `spawn_blocking` is not stopped by that drop; such
    /// plugins should watch for it and bail out early.
    async fn convert(
        &self,
        input: PluginInput<'_>,
        options: &ConversionOptions,
    ) -> Result<PluginOutput, PluginError>;

    /// Whether `extract_metadata` is implemented.
    fn supports_metadata(&self) -> bool {
        false
    }

    /// Extracts metadata from the input.
    async fn extract_metadata(&self, input: PluginInput<'_>) -> Result<MetadataResult, PluginError> {
        let _ = input;
        Err(PluginError::MetadataUnsupported {
            plugin: self.name().to_string(),
        })
    }

    /// Checks whether the options are acceptable for this plugin.
    fn validate_options(&self, _options: &ConversionOptions) -> bool {
        true
    }

    /// Called once before the plugin is registered.
    async fn initialize(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called when the plugin is removed or the engine shuts down.
    async fn cleanup(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Whether this plugin can convert `input_format` into `output_format`.
    fn can_convert(&self, input_format: &str, output_format: &str) -> bool {
        self.input_formats().iter().any(|f| f == input_format)
            && self.output_formats().iter().any(|f| f == output_format)
    }

    /// Returns a descriptive snapshot of this plugin.
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: self.name().to_string(),
            version: self.version().to_string(),
            input_formats: self.input_formats().to_vec(),
            output_formats: self.output_formats().to_vec(),
            supports_metadata: self.supports_metadata(),
        }
    }
}

/// Builds an owned format list from string literals.
pub fn format_list(formats: &[&str]) -> Vec<String> {
    formats.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShoutPlugin {
        inputs: Vec<String>,
        outputs: Vec<String>,
    }

    impl ShoutPlugin {
        fn new() -> Self {
            Self {
                inputs: format_list(&["txt"]),
                outputs: format_list(&["md", "txt"]),
            }
        }
    }

    #[async_trait]
    impl Plugin for ShoutPlugin {
        fn name(&self) -> &str {
            "shout"
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn input_formats(&self) -> &[String] {
            &self.inputs
        }

        fn output_formats(&self) -> &[String] {
            &self.outputs
        }

        async fn convert(
            &self,
            input: PluginInput<'_>,
            _options: &ConversionOptions,
        ) -> Result<PluginOutput, PluginError> {
            let text = String::from_utf8_lossy(input.data).to_uppercase();
            Ok(PluginOutput::Text(text))
        }
    }

    #[tokio::test]
    async fn test_plugin_convert() {
        let plugin = ShoutPlugin::new();
        let output = plugin
            .convert(
                PluginInput {
                    data: b"quiet",
                    format: "txt",
                },
                &ConversionOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(output.into_bytes(), b"QUIET");
    }

    #[tokio::test]
    async fn test_default_metadata_is_unsupported() {
        let plugin = ShoutPlugin::new();
        assert!(!plugin.supports_metadata());
        let err = plugin
            .extract_metadata(PluginInput {
                data: b"",
                format: "txt",
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::MetadataUnsupported { .. }));
    }

    #[test]
    fn test_can_convert() {
        let plugin = ShoutPlugin::new();
        assert!(plugin.can_convert("txt", "md"));
        assert!(!plugin.can_convert("md", "txt"));
        assert!(!plugin.can_convert("txt", "pdf"));
    }

    #[test]
    fn test_info() {
        let info = ShoutPlugin::new().info();
        assert_eq!(info.name, "shout");
        assert_eq!(info.input_formats, vec!["txt"]);
        assert!(!info.supports_metadata);
    }
}
