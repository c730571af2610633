pub mod batch;
pub mod config;
pub mod engine;
pub mod format;
pub mod metadata;
pub mod metrics;
pub mod plugin;
pub mod plugins;
pub mod testing;

pub use batch::{
    expand_patterns, plan_batch, BatchConversionOptions, BatchConversionResult, BatchError,
    BatchEvent, BatchFileError, BatchObserver, ChannelObserver,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, ConfigError,
    ForgeConfig, MemoryMode,
};
pub use engine::{
    CompressionLevel, ConversionEngine, ConversionError, ConversionInput, ConversionOptions,
    ConversionResult, EngineError,
};
pub use format::{normalize_format, DetectError, FormatCategory, FormatDetector};
pub use metadata::{BuiltinMetadataExtractor, MetadataExtractor, MetadataResult};
pub use plugin::{
    FormatDirection, Plugin, PluginError, PluginInfo, PluginInput, PluginOutput, PluginRegistry,
    SupportedFormat,
};
pub use plugins::{default_plugins, ImagePlugin, TextPlugin};
