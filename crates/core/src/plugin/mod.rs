//! Plugin module: the capability contract converters implement and the
//! registry that resolves `(input, output)` format pairs to a plugin.
//!
//! # Example
//!
//! ```ignore
//! use fileforge_core::plugin::{PluginRegistry, FormatDirection};
//!
//! let mut registry = PluginRegistry::new();
//! registry.add(Arc::new(TextPlugin::new()));
//!
//! assert!(registry.is_supported("md", FormatDirection::Input));
//! let plugin = registry.find("md", "html").expect("text plugin handles md -> html");
//! ```

mod error;
mod registry;
mod traits;
mod types;

pub use error::PluginError;
pub use registry::PluginRegistry;
pub use traits::{format_list, Plugin};
pub use types::{FormatDirection, PluginInfo, PluginInput, PluginOutput, SupportedFormat};
