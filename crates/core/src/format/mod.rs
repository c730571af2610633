//! Format tokens, the known-format catalog and input format detection.
//!
//! A format token is a lowercase extension-like string such as `"pdf"` or
//! `"png"`. Detection resolves a buffer (plus optional path hint) to a token
//! by extension, then MIME inference, then binary signature sniffing.

mod detector;
mod signature;

pub use detector::{DetectError, FormatDetector};
pub use signature::sniff_signature;

use serde::{Deserialize, Serialize};

/// Broad grouping used when listing supported formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatCategory {
    Document,
    Text,
    Data,
    Image,
    Audio,
    Video,
    Archive,
    Other,
}

impl FormatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Text => "text",
            Self::Data => "data",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Archive => "archive",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FormatCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" => Ok(Self::Document),
            "text" => Ok(Self::Text),
            "data" => Ok(Self::Data),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "archive" => Ok(Self::Archive),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown format category: {other}")),
        }
    }
}

/// Static description of formats the engine knows how to name.
const CATALOG: &[(&str, FormatCategory, &str)] = &[
    // Documents
    ("pdf", FormatCategory::Document, "Portable Document Format"),
    ("docx", FormatCategory::Document, "Microsoft Word document"),
    ("doc", FormatCategory::Document, "Legacy Microsoft Word document"),
    ("odt", FormatCategory::Document, "OpenDocument text"),
    ("rtf", FormatCategory::Document, "Rich Text Format"),
    ("epub", FormatCategory::Document, "EPUB e-book"),
    ("pptx", FormatCategory::Document, "Microsoft PowerPoint presentation"),
    ("xlsx", FormatCategory::Data, "Microsoft Excel workbook"),
    // Text
    ("txt", FormatCategory::Text, "Plain text"),
    ("md", FormatCategory::Text, "Markdown"),
    ("markdown", FormatCategory::Text, "Markdown"),
    ("html", FormatCategory::Text, "HyperText Markup Language"),
    ("htm", FormatCategory::Text, "HyperText Markup Language"),
    // Data
    ("csv", FormatCategory::Data, "Comma-separated values"),
    ("json", FormatCategory::Data, "JavaScript Object Notation"),
    ("xml", FormatCategory::Data, "Extensible Markup Language"),
    ("yaml", FormatCategory::Data, "YAML document"),
    ("toml", FormatCategory::Data, "TOML document"),
    // Images
    ("png", FormatCategory::Image, "Portable Network Graphics"),
    ("jpg", FormatCategory::Image, "JPEG image"),
    ("jpeg", FormatCategory::Image, "JPEG image"),
    ("gif", FormatCategory::Image, "Graphics Interchange Format"),
    ("bmp", FormatCategory::Image, "Windows bitmap"),
    ("tiff", FormatCategory::Image, "Tagged Image File Format"),
    ("tif", FormatCategory::Image, "Tagged Image File Format"),
    ("webp", FormatCategory::Image, "WebP image"),
    ("svg", FormatCategory::Image, "Scalable Vector Graphics"),
    ("ico", FormatCategory::Image, "Icon image"),
    // Audio
    ("mp3", FormatCategory::Audio, "MPEG audio layer III"),
    ("wav", FormatCategory::Audio, "Waveform audio"),
    ("flac", FormatCategory::Audio, "Free Lossless Audio Codec"),
    ("ogg", FormatCategory::Audio, "Ogg audio"),
    ("m4a", FormatCategory::Audio, "MPEG-4 audio"),
    // Video
    ("mp4", FormatCategory::Video, "MPEG-4 video"),
    ("mkv", FormatCategory::Video, "Matroska video"),
    ("webm", FormatCategory::Video, "WebM video"),
    ("avi", FormatCategory::Video, "Audio Video Interleave"),
    ("mov", FormatCategory::Video, "QuickTime movie"),
    // Archives
    ("zip", FormatCategory::Archive, "ZIP archive"),
    ("gz", FormatCategory::Archive, "Gzip archive"),
    ("tar", FormatCategory::Archive, "Tape archive"),
];

/// Normalizes a user-supplied format token: trims, strips a leading dot and lowercases.
pub fn normalize_format(token: &str) -> String {
    token.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Returns the category of a format token, or `Other` when unknown.
pub fn category_of(format: &str) -> FormatCategory {
    CATALOG
        .iter()
        .find(|(ext, _, _)| *ext == format)
        .map(|(_, category, _)| *category)
        .unwrap_or(FormatCategory::Other)
}

/// Returns a human description of a format token.
pub fn describe(format: &str) -> String {
    CATALOG
        .iter()
        .find(|(ext, _, _)| *ext == format)
        .map(|(_, _, description)| description.to_string())
        .unwrap_or_else(|| format!("{} file", format.to_ascii_uppercase()))
}

/// Best-effort MIME type for a format token.
pub fn mime_type_of(format: &str) -> String {
    mime_guess::from_ext(format)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
