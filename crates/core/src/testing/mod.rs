//! Testing utilities and mock implementations.
//!
//! This module provides a configurable mock plugin and fixtures, allowing
//! engine and batch behavior to be tested without real codecs.
//!
//! # Example
//!
//! ```rust,ignore
//! use fileforge_core::testing::{fixtures, MockPlugin};
//!
//! let plugin = Arc::new(MockPlugin::new("upper", &["txt"], &["md"]).uppercase());
//! engine.add_plugin(plugin.clone()).await?;
//!
//! let dir = tempfile::TempDir::new()?;
//! fixtures::write_files(dir.path(), &[("a.txt", "alpha"), ("b.txt", "beta")]);
//! ```

mod mock_plugin;

pub use mock_plugin::{MockPlugin, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    /// Encode a solid-colour RGB PNG of the given size.
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 90]));
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, image::ImageFormat::Png)
            .expect("encoding an in-memory PNG cannot fail");
        buffer.into_inner()
    }

    /// Write `(relative path, contents)` pairs under `dir`, creating subdirectories.
    pub fn write_files(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, contents)| {
                let path = dir.join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).expect("create fixture directory");
                }
                std::fs::write(&path, contents).expect("write fixture file");
                path
            })
            .collect()
    }

    /// Glob pattern matching `pattern` under `dir`.
    pub fn pattern_in(dir: &Path, pattern: &str) -> String {
        dir.join(pattern).to_string_lossy().into_owned()
    }
}
