//! Mock plugin for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::ConversionOptions;
use crate::format::mime_type_of;
use crate::metadata::MetadataResult;
use crate::plugin::{format_list, Plugin, PluginError, PluginInput, PluginOutput};

/// A recorded conversion call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Detected input format handed to the plugin.
    pub input_format: String,
    /// Requested output format.
    pub output_format: Option<String>,
    /// Input size in bytes.
    pub size: usize,
}

/// How the mock turns input into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transform {
    Echo,
    Uppercase,
}

/// Mock implementation of the Plugin trait.
///
/// Provides controllable behavior for testing:
/// - Declare arbitrary input/output formats
/// - Echo or uppercase the input
/// - Fail, panic or sleep on demand
/// - Track calls, lifecycle hooks and peak concurrency
///
/// # Example
///
/// ```rust,ignore
/// use fileforge_core::testing::MockPlugin;
///
/// let plugin = Arc::new(MockPlugin::new("upper", &["txt"], &["md"]).uppercase());
/// engine.add_plugin(plugin.clone()).await?;
///
/// engine.convert(input, "md", &options).await?;
/// assert_eq!(plugin.call_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockPlugin {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    transform: Transform,
    delay: Option<Duration>,
    /// Every conversion fails with this message.
    error: Option<String>,
    /// Conversions whose input contains this marker fail.
    fail_marker: Option<Vec<u8>>,
    /// Conversions whose input contains this marker panic.
    panic_marker: Option<Vec<u8>>,
    metadata: bool,
    metadata_fails: bool,
    reject_options: bool,
    initialize_fails: bool,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    active: AtomicUsize,
    peak: AtomicUsize,
    initialized: AtomicUsize,
    cleaned_up: AtomicUsize,
}

impl MockPlugin {
    /// Create a mock that echoes its input.
    pub fn new(name: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            inputs: format_list(inputs),
            outputs: format_list(outputs),
            transform: Transform::Echo,
            delay: None,
            error: None,
            fail_marker: None,
            panic_marker: None,
            metadata: false,
            metadata_fails: false,
            reject_options: false,
            initialize_fails: false,
            calls: Arc::new(RwLock::new(Vec::new())),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            initialized: AtomicUsize::new(0),
            cleaned_up: AtomicUsize::new(0),
        }
    }

    /// Uppercase text input, returning it as text.
    pub fn uppercase(mut self) -> Self {
        self.transform = Transform::Uppercase;
        self
    }

    /// Sleep for `delay` inside every conversion.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every conversion with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    /// Fail conversions whose input contains `marker`.
    pub fn failing_when_contains(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.as_bytes().to_vec());
        self
    }

    /// Panic in conversions whose input contains `marker`.
    pub fn panicking_when_contains(mut self, marker: &str) -> Self {
        self.panic_marker = Some(marker.as_bytes().to_vec());
        self
    }

    /// Advertise metadata extraction.
    pub fn with_metadata_support(mut self) -> Self {
        self.metadata = true;
        self
    }

    /// Make metadata extraction fail.
    pub fn failing_metadata(mut self) -> Self {
        self.metadata_fails = true;
        self
    }

    /// Reject every option set in `validate_options`.
    pub fn rejecting_options(mut self) -> Self {
        self.reject_options = true;
        self
    }

    /// Make `initialize` fail.
    pub fn failing_initialize(mut self) -> Self {
        self.initialize_fails = true;
        self
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of conversions started.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Conversions running right now.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of conversions that ran at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn initialize_count(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleaned_up.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ActiveGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ActiveGuard(&self.active)
    }

    async fn run(
        &self,
        input: PluginInput<'_>,
        options: &ConversionOptions,
    ) -> Result<PluginOutput, PluginError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(marker) = &self.panic_marker {
            if contains(input.data, marker) {
                panic!("mock plugin {} panicked", self.name);
            }
        }
        if let Some(message) = &self.error {
            return Err(PluginError::Other(message.clone()));
        }
        if let Some(marker) = &self.fail_marker {
            if contains(input.data, marker) {
                return Err(PluginError::decode(input.format, "marker found"));
            }
        }

        let output_format = options.output_format.as_deref().unwrap_or_default();
        if !self.outputs.iter().any(|f| f == output_format) {
            return Err(PluginError::UnsupportedOutput {
                format: output_format.to_string(),
            });
        }

        Ok(match self.transform {
            Transform::Echo => PluginOutput::Bytes(input.data.to_vec()),
            Transform::Uppercase => {
                PluginOutput::Text(String::from_utf8_lossy(input.data).to_uppercase())
            }
        })
    }
}

/// Decrements the active counter when a conversion ends, even by panic.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[async_trait]
impl Plugin for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "0.0.0-mock"
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
        options: &ConversionOptions,
    ) -> Result<PluginOutput, PluginError> {
        self.calls.write().await.push(RecordedCall {
            input_format: input.format.to_string(),
            output_format: options.output_format.clone(),
            size: input.data.len(),
        });

        let _active = self.enter();
        self.run(input, options).await
    }

    fn supports_metadata(&self) -> bool {
        self.metadata
    }

    async fn extract_metadata(&self, input: PluginInput<'_>) -> Result<MetadataResult, PluginError> {
        if !self.metadata {
            return Err(PluginError::MetadataUnsupported {
                plugin: self.name.clone(),
            });
        }
        if self.metadata_fails {
            return Err(PluginError::Other("metadata unavailable".to_string()));
        }

        let mut result =
            MetadataResult::new(input.format, mime_type_of(input.format), input.data.len() as u64);
        result
            .custom
            .insert("extracted_by".to_string(), self.name.clone().into());
        Ok(result)
    }

    fn validate_options(&self, _options: &ConversionOptions) -> bool {
        !self.reject_options
    }

    async fn initialize(&self) -> Result<(), PluginError> {
        if self.initialize_fails {
            return Err(PluginError::Lifecycle(format!("{} failed to start", self.name)));
        }
        self.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), PluginError> {
        self.cleaned_up.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(output: &str) -> ConversionOptions {
        ConversionOptions {
            output_format: Some(output.to_string()),
            ..Default::default()
        }
    }

    fn input(data: &[u8]) -> PluginInput<'_> {
        PluginInput { data, format: "txt" }
    }

    #[tokio::test]
    async fn test_echo_and_record() {
        let plugin = MockPlugin::new("mock", &["txt"], &["md"]);
        let output = plugin.convert(input(b"abc"), &options("md")).await.unwrap();

        assert_eq!(output, PluginOutput::Bytes(b"abc".to_vec()));
        let calls = plugin.recorded_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].input_format, "txt");
        assert_eq!(calls[0].output_format.as_deref(), Some("md"));
        assert_eq!(calls[0].size, 3);
        assert_eq!(plugin.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_failure_marker() {
        let plugin = MockPlugin::new("mock", &["txt"], &["md"]).failing_when_contains("BAD");

        assert!(plugin.convert(input(b"fine"), &options("md")).await.is_ok());
        assert!(plugin.convert(input(b"so BAD"), &options("md")).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_undeclared_output() {
        let plugin = MockPlugin::new("mock", &["txt"], &["md"]);
        let err = plugin
            .convert(input(b"x"), &options("pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::UnsupportedOutput { .. }));
    }

    #[tokio::test]
    async fn test_panic_releases_active_slot() {
        let plugin = Arc::new(
            MockPlugin::new("mock", &["txt"], &["md"]).panicking_when_contains("PANIC"),
        );

        let panicking = plugin.clone();
        let outcome = tokio::spawn(async move {
            let data = b"PANIC".to_vec();
            panicking.convert(input(&data), &options("md")).await
        })
        .await;

        assert!(outcome.unwrap_err().is_panic());
        assert_eq!(plugin.active_count(), 0);

        plugin.convert(input(b"fine"), &options("md")).await.unwrap();
        assert_eq!(plugin.active_count(), 0);
        assert_eq!(plugin.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_counters() {
        let plugin = MockPlugin::new("mock", &["txt"], &["md"]);
        plugin.initialize().await.unwrap();
        plugin.cleanup().await.unwrap();
        assert_eq!(plugin.initialize_count(), 1);
        assert_eq!(plugin.cleanup_count(), 1);

        let broken = MockPlugin::new("broken", &["txt"], &["md"]).failing_initialize();
        assert!(broken.initialize().await.is_err());
        assert_eq!(broken.initialize_count(), 0);
    }
}
