//! Trait definitions for the metadata module.

use async_trait::async_trait;
use std::path::Path;

use super::types::MetadataResult;

/// Service that extracts metadata from a buffer.
///
/// Never fails: per-field failures leave the field empty and the rest of the
/// result is still returned.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    async fn extract(&self, buffer: &[u8], format: &str, path_hint: Option<&Path>) -> MetadataResult;
}
