//! Built-in best-effort metadata extractor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use super::traits::MetadataExtractor;
use super::types::{Dimensions, DocumentInfo, MetadataResult};
use crate::format::{category_of, mime_type_of, FormatCategory};

static PDF_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Type\s*/Page[^s]").unwrap());
static PDF_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Title\s*\(([^)]*)\)").unwrap());
static PDF_AUTHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Author\s*\(([^)]*)\)").unwrap());
static HTML_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Extractor that derives metadata from the bytes alone, plus filesystem
/// timestamps when a path is known.
#[derive(Debug, Clone, Default)]
pub struct BuiltinMetadataExtractor;

impl BuiltinMetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    async fn fill_timestamps(result: &mut MetadataResult, path: &Path) {
        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No filesystem metadata");
                return;
            }
        };
        result.created = meta.created().ok().map(DateTime::<Utc>::from);
        result.modified = meta.modified().ok().map(DateTime::<Utc>::from);
    }

    fn fill_image(result: &mut MetadataResult, buffer: &[u8]) {
        let dimensions = image::ImageReader::new(Cursor::new(buffer))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());

        if let Some((width, height)) = dimensions {
            result.dimensions = Some(Dimensions { width, height });
        }
    }

    fn fill_text(result: &mut MetadataResult, buffer: &[u8], format: &str) {
        let text = String::from_utf8_lossy(buffer);

        let (title, plain) = match format {
            "html" | "htm" => {
                let title = HTML_TITLE
                    .captures(&text)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().trim().to_string());
                (title, HTML_TAG.replace_all(&text, " ").into_owned())
            }
            "md" | "markdown" => {
                let title = text
                    .lines()
                    .find_map(|line| line.strip_prefix("# "))
                    .map(|t| t.trim().to_string());
                (title, text.to_string())
            }
            _ => (None, text.to_string()),
        };

        let document = DocumentInfo {
            word_count: Some(plain.split_whitespace().count() as u64),
            title: title.filter(|t| !t.is_empty()),
            ..Default::default()
        };

        result
            .custom
            .insert("line_count".to_string(), text.lines().count().into());
        result.document = Some(document);
        result.extracted_text = Some(plain.trim().to_string());
    }

    fn fill_pdf(result: &mut MetadataResult, buffer: &[u8]) {
        let raw = String::from_utf8_lossy(buffer);
        let pages = PDF_PAGE.find_iter(&raw).count();
        let capture = |re: &Regex| {
            re.captures(&raw)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let document = DocumentInfo {
            page_count: (pages > 0).then_some(pages as u32),
            title: capture(&PDF_TITLE),
            author: capture(&PDF_AUTHOR),
            word_count: None,
        };

        if !document.is_empty() {
            result.document = Some(document);
        }
    }
}

#[async_trait]
impl MetadataExtractor for BuiltinMetadataExtractor {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn extract(&self, buffer: &[u8], format: &str, path_hint: Option<&Path>) -> MetadataResult {
        let mut result = MetadataResult::new(format, mime_type_of(format), buffer.len() as u64);

        if let Some(path) = path_hint {
            Self::fill_timestamps(&mut result, path).await;
        }

        match (format, category_of(format)) {
            ("pdf", _) => Self::fill_pdf(&mut result, buffer),
            (_, FormatCategory::Image) => Self::fill_image(&mut result, buffer),
            ("txt" | "md" | "markdown" | "html" | "htm" | "csv", _) => {
                Self::fill_text(&mut result, buffer, format)
            }
            _ => {}
        }

        result.custom.insert(
            "sha256".to_string(),
            format!("{:x}", Sha256::digest(buffer)).into(),
        );

        result
    }
}
