//! The conversion engine and its single-file pipeline.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::error::{ConversionError, EngineError};
use super::options::{CompressionLevel, ConversionOptions};
use super::persist::{resolve_output_path, write_atomic};
use super::types::{ConversionInput, ConversionResult};
use crate::config::ForgeConfig;
use crate::format::{normalize_format, FormatDetector};
use crate::metadata::{BuiltinMetadataExtractor, MetadataExtractor, MetadataResult};
use crate::metrics;
use crate::plugin::{
    FormatDirection, Plugin, PluginError, PluginInfo, PluginInput, PluginRegistry, SupportedFormat,
};

/// Drives single conversions against a registry of plugins.
///
/// Cloning is cheap: clones share the registry, the metadata extractor and the
/// configuration.
#[derive(Clone)]
pub struct ConversionEngine {
    registry: Arc<RwLock<PluginRegistry>>,
    extractor: Arc<dyn MetadataExtractor>,
    config: Arc<ForgeConfig>,
}

impl std::fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionEngine")
            .field("extractor", &self.extractor.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// What the transform step decided to run.
enum Transform {
    Passthrough,
    Plugin(Arc<dyn Plugin>),
}

impl ConversionEngine {
    /// Creates an engine with an empty registry.
    pub fn new(config: ForgeConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(PluginRegistry::new())),
            extractor: Arc::new(BuiltinMetadataExtractor::new()),
            config: Arc::new(config),
        }
    }

    /// Creates an engine with the built-in plugins that the config does not disable.
    pub async fn with_default_plugins(config: ForgeConfig) -> Result<Self, PluginError> {
        let engine = Self::new(config);
        for plugin in crate::plugins::default_plugins() {
            if engine.config.plugins.is_disabled(plugin.name()) {
                debug!(plugin = %plugin.name(), "Built-in plugin disabled by config");
                continue;
            }
            engine.add_plugin(plugin).await?;
        }
        Ok(engine)
    }

    /// Replaces the metadata extractor used when no plugin provides metadata.
    pub fn with_metadata_extractor(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Initializes and registers a plugin.
    ///
    /// A plugin whose `initialize` fails is not registered. A plugin with the
    /// same name is replaced and cleaned up.
    pub async fn add_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<(), PluginError> {
        plugin.initialize().await?;

        let replaced = self.registry.write().await.add(plugin);
        if let Some(old) = replaced {
            cleanup_plugin(old.as_ref()).await;
        }
        Ok(())
    }

    /// Unregisters a plugin and runs its cleanup. Unknown names are ignored.
    pub async fn remove_plugin(&self, name: &str) {
        let removed = self.registry.write().await.remove(name);
        if let Some(plugin) = removed {
            cleanup_plugin(plugin.as_ref()).await;
        }
    }

    /// Runs cleanup on every registered plugin.
    pub async fn shutdown(&self) {
        let plugins = self.registry.read().await.plugins().to_vec();
        for plugin in plugins {
            cleanup_plugin(plugin.as_ref()).await;
        }
        info!("Conversion engine shut down");
    }

    pub async fn supported_formats(&self) -> Vec<SupportedFormat> {
        self.registry.read().await.list_supported_formats()
    }

    pub async fn is_format_supported(&self, format: &str, direction: FormatDirection) -> bool {
        self.registry.read().await.is_supported(format, direction)
    }

    /// Lists registered plugins in registration order.
    pub async fn plugins(&self) -> Vec<PluginInfo> {
        self.registry.read().await.list()
    }

    /// Detects the format of a buffer against the registered formats.
    pub async fn detect_format(
        &self,
        buffer: &[u8],
        path_hint: Option<&Path>,
    ) -> Result<String, ConversionError> {
        let registry = self.registry.read().await;
        Ok(FormatDetector::new(&registry).detect(buffer, path_hint)?)
    }

    /// Converts `input` into `output_format`.
    ///
    /// Expected failures are reported in the returned result; `Err` is
    /// returned only for malformed calls.
    pub async fn convert(
        &self,
        input: impl Into<ConversionInput>,
        output_format: &str,
        options: &ConversionOptions,
    ) -> Result<ConversionResult, EngineError> {
        let started = Instant::now();
        options.validate()?;

        let output_format = normalize_format(output_format);
        if output_format.is_empty() {
            return Err(EngineError::invalid_options("output format must not be empty"));
        }

        let mut options = options.clone();
        options.output_format = Some(output_format.clone());

        let _inflight = metrics::InflightGuard::new();
        let mut result = ConversionResult::pending(&output_format);

        if let Err(err) = self
            .run(input.into(), &output_format, &options, &mut result)
            .await
        {
            warn!(
                output_format = %output_format,
                kind = err.kind(),
                error = %err,
                "Conversion failed"
            );
            metrics::CONVERSION_ERRORS
                .with_label_values(&[err.kind()])
                .inc();
            result.fail(err);
        }

        let elapsed = started.elapsed();
        result.processing_time_secs = elapsed.as_secs_f64();

        let label = if result.success { "success" } else { "failed" };
        metrics::CONVERSIONS_TOTAL.with_label_values(&[label]).inc();
        metrics::CONVERSION_DURATION
            .with_label_values(&[label])
            .observe(elapsed.as_secs_f64());

        Ok(result)
    }

    async fn run(
        &self,
        input: ConversionInput,
        output_format: &str,
        options: &ConversionOptions,
        result: &mut ConversionResult,
    ) -> Result<(), ConversionError> {
        let loaded = input
            .load(options.streaming, options.buffer_size)
            .await
            .map_err(|e| ConversionError::io("reading input", e))?;
        let source = loaded.source.as_deref();
        let data = loaded.data;
        result.original_size = data.len() as u64;

        let (input_format, transform, metadata_provider) = {
            let registry = self.registry.read().await;

            let input_format =
                FormatDetector::new(&registry).detect(&data, loaded.hint.as_deref().or(source))?;
            result.original_format = input_format.clone();
            debug!(
                input_format = %input_format,
                output_format = %output_format,
                size = data.len(),
                "Detected input format"
            );

            if !registry.is_supported(&input_format, FormatDirection::Input) {
                return Err(ConversionError::UnsupportedInputFormat {
                    format: input_format,
                });
            }
            if !registry.is_supported(output_format, FormatDirection::Output) {
                return Err(ConversionError::UnsupportedOutputFormat {
                    format: output_format.to_string(),
                });
            }

            let transform = select_transform(&registry, &input_format, output_format, options)?;
            let provider = options
                .metadata
                .then(|| registry.find_metadata_provider(&input_format))
                .flatten();
            (input_format, transform, provider)
        };

        if options.metadata {
            let metadata = self
                .metadata_for(
                    &data,
                    &input_format,
                    source,
                    metadata_provider,
                    &mut result.warnings,
                )
                .await;
            result.metadata = Some(metadata);
        }

        let output = match transform {
            Transform::Passthrough => {
                debug!(format = %input_format, "Passing input through unchanged");
                data
            }
            Transform::Plugin(plugin) => {
                self.invoke(plugin.as_ref(), &data, &input_format, options)
                    .await?
            }
        };

        if options.wants_persistence() {
            let path = resolve_output_path(options, source, output_format);
            write_atomic(&path, &output)
                .await
                .map_err(|e| ConversionError::io("writing output", e))?;
            info!(path = %path.display(), bytes = output.len(), "Output written");
            result.output_path = Some(path);
        }

        result.succeed(output);
        Ok(())
    }

    async fn invoke(
        &self,
        plugin: &dyn Plugin,
        data: &[u8],
        input_format: &str,
        options: &ConversionOptions,
    ) -> Result<Vec<u8>, ConversionError> {
        if !plugin.validate_options(options) {
            return Err(ConversionError::InvalidPluginOptions {
                plugin: plugin.name().to_string(),
            });
        }

        debug!(plugin = %plugin.name(), input_format = %input_format, "Invoking plugin");
        let input = PluginInput {
            data,
            format: input_format,
        };

        match tokio::time::timeout(self.config.timeout(), plugin.convert(input, options)).await {
            Ok(Ok(output)) => Ok(output.into_bytes()),
            Ok(Err(source)) => Err(ConversionError::PluginConversion {
                plugin: plugin.name().to_string(),
                source,
            }),
            Err(_) => Err(ConversionError::Timeout {
                plugin: plugin.name().to_string(),
                timeout_secs: self.config.timeout_secs,
            }),
        }
    }

    async fn metadata_for(
        &self,
        data: &[u8],
        format: &str,
        source: Option<&Path>,
        provider: Option<Arc<dyn Plugin>>,
        warnings: &mut Vec<String>,
    ) -> MetadataResult {
        if let Some(plugin) = provider {
            let input = PluginInput { data, format };
            match plugin.extract_metadata(input).await {
                Ok(metadata) => return metadata,
                Err(e) => {
                    let warning = format!("Metadata extraction by {} failed: {}", plugin.name(), e);
                    warn!(plugin = %plugin.name(), error = %e, "Metadata extraction failed");
                    warnings.push(warning);
                }
            }
        }
        self.extractor.extract(data, format, source).await
    }

    /// Extracts metadata from an input without converting it.
    ///
    /// `format_hint` skips detection when given.
    pub async fn extract_metadata(
        &self,
        input: impl Into<ConversionInput>,
        format_hint: Option<&str>,
    ) -> Result<MetadataResult, ConversionError> {
        let loaded = input
            .into()
            .load(false, self.config.memory.buffer_size())
            .await
            .map_err(|e| ConversionError::io("reading input", e))?;

        let (format, provider) = {
            let registry = self.registry.read().await;
            let format = match format_hint {
                Some(hint) => normalize_format(hint),
                None => FormatDetector::new(&registry).detect(&loaded.data, loaded.detection_path())?,
            };
            let provider = registry.find_metadata_provider(&format);
            (format, provider)
        };

        let mut warnings = Vec::new();
        Ok(self
            .metadata_for(
                &loaded.data,
                &format,
                loaded.source.as_deref(),
                provider,
                &mut warnings,
            )
            .await)
    }
}

/// Picks the transform for a detected pair, honouring a pinned plugin.
fn select_transform(
    registry: &PluginRegistry,
    input_format: &str,
    output_format: &str,
    options: &ConversionOptions,
) -> Result<Transform, ConversionError> {
    let no_plugin = || ConversionError::NoPluginFound {
        input: input_format.to_string(),
        output: output_format.to_string(),
    };

    if let Some(name) = &options.plugin {
        return registry
            .get(name)
            .filter(|p| p.can_convert(input_format, output_format))
            .map(Transform::Plugin)
            .ok_or_else(no_plugin);
    }

    if input_format == output_format {
        if options.compression == CompressionLevel::None {
            return Ok(Transform::Passthrough);
        }
        return Ok(registry
            .find(input_format, output_format)
            .map(Transform::Plugin)
            .unwrap_or(Transform::Passthrough));
    }

    registry
        .find(input_format, output_format)
        .map(Transform::Plugin)
        .ok_or_else(no_plugin)
}

async fn cleanup_plugin(plugin: &dyn Plugin) {
    if let Err(e) = plugin.cleanup().await {
        warn!(plugin = %plugin.name(), error = %e, "Plugin cleanup failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPlugin;
    use std::time::Duration;

    async fn engine_with(plugins: Vec<MockPlugin>) -> ConversionEngine {
        let engine = ConversionEngine::new(ForgeConfig::default());
        for plugin in plugins {
            engine.add_plugin(Arc::new(plugin)).await.unwrap();
        }
        engine
    }

    fn txt(data: &[u8]) -> ConversionInput {
        ConversionInput::bytes_with_hint(data.to_vec(), "note.txt")
    }

    #[tokio::test]
    async fn test_convert_uppercase() {
        let engine = engine_with(vec![MockPlugin::new("upper", &["txt"], &["md"]).uppercase()]).await;

        let result = engine
            .convert(txt(b"hello text"), "md", &ConversionOptions::default())
            .await
            .unwrap();

        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.original_format, "txt");
        assert_eq!(result.output_format, "md");
        assert_eq!(result.original_size, 10);
        assert_eq!(result.data.as_deref(), Some(&b"HELLO TEXT"[..]));
        assert_eq!(result.output_size, Some(10));
    }

    #[tokio::test]
    async fn test_unsupported_output_format() {
        let engine = engine_with(vec![MockPlugin::new("p", &["txt"], &["md"])]).await;

        let result = engine
            .convert(txt(b"x"), "docx", &ConversionOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(result.errors[0].contains("Unsupported output format: docx"));
    }

    #[tokio::test]
    async fn test_unsupported_input_format() {
        let engine = engine_with(vec![MockPlugin::new("p", &["txt"], &["md"])]).await;

        let result = engine
            .convert(b"%PDF-1.4 body".to_vec(), "md", &ConversionOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.original_format, "pdf");
        assert!(result.errors[0].contains("Unsupported input format: pdf"));
    }

    #[tokio::test]
    async fn test_no_plugin_for_pair() {
        let engine = engine_with(vec![
            MockPlugin::new("a", &["pdf"], &["txt"]),
            MockPlugin::new("b", &["txt"], &["docx"]),
        ])
        .await;

        let input = ConversionInput::bytes_with_hint(b"%PDF-1.4".to_vec(), "x.pdf");
        let result = engine
            .convert(input, "docx", &ConversionOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.errors[0].contains("No plugin found"));
    }

    #[tokio::test]
    async fn test_same_format_without_compression_is_identity() {
        let plugin = Arc::new(MockPlugin::new("p", &["txt"], &["txt"]).uppercase());
        let engine = ConversionEngine::new(ForgeConfig::default());
        engine.add_plugin(plugin.clone()).await.unwrap();

        let options = ConversionOptions::default().with_compression(CompressionLevel::None);
        let result = engine.convert(txt(b"keep me"), "txt", &options).await.unwrap();

        assert!(result.success);
        assert_eq!(result.data.as_deref(), Some(&b"keep me"[..]));
        assert_eq!(plugin.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_same_format_with_compression_uses_plugin() {
        let engine = engine_with(vec![MockPlugin::new("p", &["txt"], &["txt"]).uppercase()]).await;

        let result = engine
            .convert(txt(b"shrink"), "txt", &ConversionOptions::default())
            .await
            .unwrap();
        assert_eq!(result.data.as_deref(), Some(&b"SHRINK"[..]));
    }

    #[tokio::test]
    async fn test_same_format_without_plugin_passes_through() {
        // txt is readable and writable, but no single plugin does txt -> txt
        let engine = engine_with(vec![
            MockPlugin::new("reader", &["txt"], &["md"]),
            MockPlugin::new("writer", &["md"], &["txt"]),
        ])
        .await;

        let result = engine
            .convert(txt(b"as is"), "txt", &ConversionOptions::default())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.data.as_deref(), Some(&b"as is"[..]));
    }

    #[tokio::test]
    async fn test_plugin_failure_is_captured() {
        let engine = engine_with(vec![MockPlugin::new("p", &["txt"], &["md"]).failing("boom")]).await;

        let result = engine
            .convert(txt(b"x"), "md", &ConversionOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.errors[0].contains("Plugin p failed"));
        assert!(result.errors[0].contains("boom"));
    }

    #[tokio::test]
    async fn test_plugin_timeout() {
        let config = ForgeConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let engine = ConversionEngine::new(config);
        engine
            .add_plugin(Arc::new(
                MockPlugin::new("slow", &["txt"], &["md"]).with_delay(Duration::from_secs(5)),
            ))
            .await
            .unwrap();

        let result = engine
            .convert(txt(b"x"), "md", &ConversionOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.errors[0].contains("timed out after 1 seconds"));
    }

    #[tokio::test]
    async fn test_rejected_options() {
        let engine =
            engine_with(vec![MockPlugin::new("picky", &["txt"], &["md"]).rejecting_options()]).await;

        let result = engine
            .convert(txt(b"x"), "md", &ConversionOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.errors[0].contains("rejected the conversion options"));
    }

    #[tokio::test]
    async fn test_pinned_plugin() {
        let engine = engine_with(vec![
            MockPlugin::new("first", &["txt"], &["md"]),
            MockPlugin::new("second", &["txt"], &["md"]).uppercase(),
        ])
        .await;

        let options = ConversionOptions::default().with_plugin("second");
        let result = engine.convert(txt(b"pin"), "md", &options).await.unwrap();
        assert_eq!(result.data.as_deref(), Some(&b"PIN"[..]));

        let options = ConversionOptions::default().with_plugin("missing");
        let result = engine.convert(txt(b"pin"), "md", &options).await.unwrap();
        assert!(!result.success);
        assert!(result.errors[0].contains("No plugin found"));
    }

    #[tokio::test]
    async fn test_invalid_options_are_fatal() {
        let engine = engine_with(vec![MockPlugin::new("p", &["txt"], &["md"])]).await;

        let options = ConversionOptions::default().with_quality(150);
        assert!(engine.convert(txt(b"x"), "md", &options).await.is_err());
        assert!(engine
            .convert(txt(b"x"), "  ", &ConversionOptions::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_failure() {
        let engine = engine_with(vec![MockPlugin::new("p", &["txt"], &["md"])]).await;

        let result = engine
            .convert("/no/such/file.txt", "md", &ConversionOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.errors[0].contains("I/O failure while reading input"));
    }

    #[tokio::test]
    async fn test_metadata_warning_falls_back_to_builtin() {
        let plugin = MockPlugin::new("meta", &["txt"], &["md"])
            .with_metadata_support()
            .failing_metadata();
        let engine = engine_with(vec![plugin]).await;

        let options = ConversionOptions::default().with_metadata(true);
        let result = engine.convert(txt(b"two words"), "md", &options).await.unwrap();

        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.file_size, 9);
        assert_eq!(metadata.document.unwrap().word_count, Some(2));
    }

    #[tokio::test]
    async fn test_metadata_from_plugin() {
        let engine = engine_with(vec![
            MockPlugin::new("meta", &["txt"], &["md"]).with_metadata_support(),
        ])
        .await;

        let metadata = engine
            .extract_metadata(txt(b"abc"), None)
            .await
            .unwrap();
        assert_eq!(metadata.custom["extracted_by"], "meta");
    }

    #[tokio::test]
    async fn test_persist_to_output_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("in.txt");
        std::fs::write(&source, b"disk").unwrap();

        let engine = engine_with(vec![MockPlugin::new("p", &["txt"], &["md"]).uppercase()]).await;
        let options = ConversionOptions::default().with_output_dir(dir.path().join("out"));

        let result = engine.convert(source.as_path(), "md", &options).await.unwrap();
        let path = result.output_path.clone().unwrap();
        assert_eq!(path, dir.path().join("out/in.md"));
        assert_eq!(std::fs::read(path).unwrap(), b"DISK");
        assert!(result.data.is_some());
    }

    #[tokio::test]
    async fn test_bytes_hint_never_names_or_stats_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let unrelated = dir.path().join("report.txt");
        std::fs::write(&unrelated, b"someone else's file").unwrap();

        let engine = engine_with(vec![MockPlugin::new("p", &["txt"], &["md"]).uppercase()]).await;
        let out_dir = dir.path().join("out");
        let options = ConversionOptions::default()
            .with_output_dir(&out_dir)
            .with_metadata(true);

        let input = ConversionInput::bytes_with_hint(b"in memory".to_vec(), &unrelated);
        let result = engine.convert(input, "md", &options).await.unwrap();

        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.original_format, "txt");
        assert_eq!(result.output_path, Some(out_dir.join("output.md")));
        assert_eq!(std::fs::read(out_dir.join("output.md")).unwrap(), b"IN MEMORY");

        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.file_size, 9);
        assert!(metadata.modified.is_none());
        assert!(metadata.created.is_none());
    }

    #[tokio::test]
    async fn test_processing_time_is_fractional() {
        let engine = engine_with(vec![MockPlugin::new("p", &["txt"], &["md"])]).await;

        let result = engine
            .convert(txt(b"quick"), "md", &ConversionOptions::default())
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.processing_time_secs > 0.0);
        assert!(result.processing_time_secs < 5.0);
    }

    #[tokio::test]
    async fn test_add_plugin_refused_when_initialize_fails() {
        let engine = ConversionEngine::new(ForgeConfig::default());
        let result = engine
            .add_plugin(Arc::new(
                MockPlugin::new("broken", &["txt"], &["md"]).failing_initialize(),
            ))
            .await;

        assert!(result.is_err());
        assert!(!engine.is_format_supported("txt", FormatDirection::Input).await);
    }

    #[tokio::test]
    async fn test_remove_plugin_runs_cleanup() {
        let plugin = Arc::new(MockPlugin::new("p", &["txt"], &["md"]));
        let engine = ConversionEngine::new(ForgeConfig::default());
        engine.add_plugin(plugin.clone()).await.unwrap();

        engine.remove_plugin("p").await;
        engine.remove_plugin("p").await;
        assert_eq!(plugin.initialize_count(), 1);
        assert_eq!(plugin.cleanup_count(), 1);
        assert!(engine.supported_formats().await.is_empty());
    }

    #[tokio::test]
    async fn test_default_plugins_respect_disabled() {
        let mut config = ForgeConfig::default();
        config.plugins.disabled = vec!["image".to_string()];

        let engine = ConversionEngine::with_default_plugins(config).await.unwrap();
        let names: Vec<_> = engine.plugins().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["text"]);
    }
}
