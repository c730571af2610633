//! Types shared by plugins and the registry.

use serde::{Deserialize, Serialize};

use crate::format::FormatCategory;

/// Which side of a conversion a format is queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatDirection {
    Input,
    Output,
}

impl std::str::FromStr for FormatDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            other => Err(format!("unknown format direction: {other}")),
        }
    }
}

/// Input handed to a plugin: the raw bytes and their detected format token.
#[derive(Debug, Clone, Copy)]
pub struct PluginInput<'a> {
    pub data: &'a [u8],
    pub format: &'a str,
}

/// Output produced by a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOutput {
    Bytes(Vec<u8>),
    Text(String),
}

impl PluginOutput {
    /// Returns the output as bytes, encoding text as UTF-8.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.into_bytes(),
        }
    }
}

impl From<Vec<u8>> for PluginOutput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<String> for PluginOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Descriptive snapshot of a registered plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub input_formats: Vec<String>,
    pub output_formats: Vec<String>,
    pub supports_metadata: bool,
}

/// A format as seen across all registered plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFormat {
    pub extension: String,
    pub mime_type: String,
    pub category: FormatCategory,
    pub description: String,
    pub can_read: bool,
    pub can_write: bool,
    pub has_metadata: bool,
}
