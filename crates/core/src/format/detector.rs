//! Input format detection against the set of registered formats.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::normalize_format;
use super::signature::sniff_signature;
use crate::plugin::{FormatDirection, PluginRegistry};

/// Placeholder name used for MIME inference when no path hint exists.
const PLACEHOLDER_NAME: &str = "input";

/// Errors produced by format detection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectError {
    /// Neither extension, MIME inference nor signature sniffing matched.
    #[error("Unable to detect input format")]
    UnknownFormat,
}

/// Resolves a buffer to a format token.
///
/// Resolution order, first match wins:
/// 1. the path hint's extension, when some plugin reads it;
/// 2. the MIME type inferred from the extension, mapped back to a registered extension;
/// 3. the buffer's binary signature.
///
/// The result depends only on the buffer, the path hint and the registry.
pub struct FormatDetector<'a> {
    registry: &'a PluginRegistry,
}

impl<'a> FormatDetector<'a> {
    pub fn new(registry: &'a PluginRegistry) -> Self {
        Self { registry }
    }

    pub fn detect(&self, buffer: &[u8], path_hint: Option<&Path>) -> Result<String, DetectError> {
        let extension = path_hint
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(normalize_format)
            .filter(|e| !e.is_empty());

        if let Some(ext) = &extension {
            if self.is_registered(ext) {
                debug!(format = %ext, "Detected format from extension");
                return Ok(ext.clone());
            }
        }

        if let Some(ext) = self.detect_by_mime(extension.as_deref()) {
            debug!(format = %ext, "Detected format from MIME type");
            return Ok(ext);
        }

        match sniff_signature(buffer) {
            Some(format) => {
                debug!(format = %format, "Detected format from signature");
                Ok(format.to_string())
            }
            None => Err(DetectError::UnknownFormat),
        }
    }

    fn detect_by_mime(&self, extension: Option<&str>) -> Option<String> {
        let probe_name = match extension {
            Some(ext) => format!("{PLACEHOLDER_NAME}.{ext}"),
            None => PLACEHOLDER_NAME.to_string(),
        };

        mime_guess::from_path(&probe_name)
            .iter()
            .filter_map(|mime| mime_guess::get_mime_extensions(&mime))
            .flat_map(|exts| exts.iter())
            .map(|ext| normalize_format(ext))
            .find(|ext| self.is_registered(ext))
    }

    fn is_registered(&self, format: &str) -> bool {
        self.registry.is_supported(format, FormatDirection::Input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPlugin;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn registry(inputs: &[&str]) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.add(Arc::new(MockPlugin::new("mock", inputs, &["txt"])));
        registry
    }

    #[test]
    fn test_registered_extension_wins() {
        let registry = registry(&["txt", "pdf"]);
        let detector = FormatDetector::new(&registry);

        // extension beats the PDF signature
        let format = detector
            .detect(b"%PDF-1.4", Some(&PathBuf::from("notes.TXT")))
            .unwrap();
        assert_eq!(format, "txt");
    }

    #[test]
    fn test_mime_maps_alias_extension() {
        let registry = registry(&["jpg"]);
        let detector = FormatDetector::new(&registry);

        let format = detector
            .detect(b"not really a jpeg", Some(&PathBuf::from("photo.jpeg")))
            .unwrap();
        assert_eq!(format, "jpg");
    }

    #[test]
    fn test_falls_back_to_signature() {
        let registry = registry(&["txt"]);
        let detector = FormatDetector::new(&registry);

        let format = detector.detect(b"%PDF-1.7 body", None).unwrap();
        assert_eq!(format, "pdf");

        let format = detector
            .detect(b"\x89PNG\r\n\x1a\n....", Some(&PathBuf::from("image.unknownext")))
            .unwrap();
        assert_eq!(format, "png");
    }

    #[test]
    fn test_unknown_format() {
        let registry = registry(&["txt"]);
        let detector = FormatDetector::new(&registry);

        let err = detector.detect(b"\x07\x00\x13\x37", None).unwrap_err();
        assert_eq!(err, DetectError::UnknownFormat);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let registry = registry(&["txt", "md"]);
        let detector = FormatDetector::new(&registry);
        let hint = PathBuf::from("readme.md");

        let first = detector.detect(b"# Title", Some(&hint)).unwrap();
        for _ in 0..10 {
            assert_eq!(detector.detect(b"# Title", Some(&hint)).unwrap(), first);
        }
    }
}
