//! Plugin registry: registration order, capability lookup and format listing.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::traits::Plugin;
use super::types::{FormatDirection, PluginInfo, SupportedFormat};
use crate::format::{category_of, describe, mime_type_of, normalize_format};

/// Holds registered plugins in registration order.
///
/// Names are unique. Registering a plugin under a name that is already taken
/// replaces the previous plugin (last write wins); the replacement takes the
/// newest position in the order. Lookups walk the plugins in registration order
/// and the first capable plugin wins.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PluginRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin, returning the plugin it replaced, if any.
    pub fn add(&mut self, plugin: Arc<dyn Plugin>) -> Option<Arc<dyn Plugin>> {
        let replaced = self.take(plugin.name());

        if replaced.is_some() {
            info!(plugin = %plugin.name(), version = %plugin.version(), "Replacing plugin");
        } else {
            info!(plugin = %plugin.name(), version = %plugin.version(), "Registering plugin");
        }

        self.plugins.push(plugin);
        replaced
    }

    /// Unregisters a plugin by name. Unknown names are ignored.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Plugin>> {
        let removed = self.take(name);
        match &removed {
            Some(_) => info!(plugin = %name, "Plugin unregistered"),
            None => debug!(plugin = %name, "Remove requested for unknown plugin"),
        }
        removed
    }

    fn take(&mut self, name: &str) -> Option<Arc<dyn Plugin>> {
        let index = self.plugins.iter().position(|p| p.name() == name)?;
        Some(self.plugins.remove(index))
    }

    /// Gets a plugin by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.name() == name).cloned()
    }

    /// Returns the first plugin, in registration order, that converts between the formats.
    pub fn find(&self, input_format: &str, output_format: &str) -> Option<Arc<dyn Plugin>> {
        let input_format = normalize_format(input_format);
        let output_format = normalize_format(output_format);

        self.plugins
            .iter()
            .find(|p| p.can_convert(&input_format, &output_format))
            .cloned()
    }

    /// Whether any plugin declares the format for the given direction.
    pub fn is_supported(&self, format: &str, direction: FormatDirection) -> bool {
        let format = normalize_format(format);

        self.plugins.iter().any(|p| {
            let formats = match direction {
                FormatDirection::Input => p.input_formats(),
                FormatDirection::Output => p.output_formats(),
            };
            formats.iter().any(|f| *f == format)
        })
    }

    /// Returns the first plugin that reads `format` and can extract metadata from it.
    pub fn find_metadata_provider(&self, format: &str) -> Option<Arc<dyn Plugin>> {
        let format = normalize_format(format);

        self.plugins
            .iter()
            .find(|p| p.supports_metadata() && p.input_formats().iter().any(|f| *f == format))
            .cloned()
    }

    /// Aggregates capabilities per distinct extension, ordered by extension.
    pub fn list_supported_formats(&self) -> Vec<SupportedFormat> {
        let mut formats: BTreeMap<String, SupportedFormat> = BTreeMap::new();

        for plugin in &self.plugins {
            for ext in plugin.input_formats() {
                let entry = formats
                    .entry(ext.clone())
                    .or_insert_with(|| empty_format(ext));
                entry.can_read = true;
                entry.has_metadata |= plugin.supports_metadata();
            }
            for ext in plugin.output_formats() {
                formats
                    .entry(ext.clone())
                    .or_insert_with(|| empty_format(ext))
                    .can_write = true;
            }
        }

        formats.into_values().collect()
    }

    /// Returns registered plugins in registration order.
    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// Lists info for all registered plugins in registration order.
    pub fn list(&self) -> Vec<PluginInfo> {
        self.plugins.iter().map(|p| p.info()).collect()
    }

    /// Returns plugin count.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

fn empty_format(ext: &str) -> SupportedFormat {
    SupportedFormat {
        extension: ext.to_string(),
        mime_type: mime_type_of(ext),
        category: category_of(ext),
        description: describe(ext),
        can_read: false,
        can_write: false,
        has_metadata: false,
    }
}
