//! Built-in plugins registered by `ConversionEngine::with_default_plugins`.

mod image;
mod text;

pub use self::image::ImagePlugin;
pub use self::text::TextPlugin;

use std::sync::Arc;

use crate::plugin::Plugin;

/// The built-in plugins, in registration order.
pub fn default_plugins() -> Vec<Arc<dyn Plugin>> {
    vec![Arc::new(TextPlugin::new()), Arc::new(ImagePlugin::new())]
}
