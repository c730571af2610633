//! Types for the engine module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::metadata::MetadataResult;

/// Input accepted by the engine: raw bytes or a file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionInput {
    /// In-memory bytes, with an optional path used only as a detection hint.
    Bytes { data: Vec<u8>, hint: Option<PathBuf> },
    /// A file read fully into memory.
    Path(PathBuf),
}

impl ConversionInput {
    /// Bytes with a path hint for format detection.
    pub fn bytes_with_hint(data: impl Into<Vec<u8>>, hint: impl Into<PathBuf>) -> Self {
        Self::Bytes {
            data: data.into(),
            hint: Some(hint.into()),
        }
    }

    /// The path hint, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Bytes { hint, .. } => hint.as_deref(),
            Self::Path(path) => Some(path),
        }
    }

    /// Loads the input into memory.
    ///
    /// With `streaming`, files are read through a buffer of `buffer_size` bytes.
    pub(crate) async fn load(self, streaming: bool, buffer_size: usize) -> std::io::Result<LoadedInput> {
        match self {
            Self::Bytes { data, hint } => Ok(LoadedInput {
                data,
                hint,
                source: None,
            }),
            Self::Path(path) if streaming => {
                let file = tokio::fs::File::open(&path).await?;
                let mut reader = tokio::io::BufReader::with_capacity(buffer_size, file);
                let mut data = Vec::new();
                reader.read_to_end(&mut data).await?;
                Ok(LoadedInput::from_file(data, path))
            }
            Self::Path(path) => {
                let data = tokio::fs::read(&path).await?;
                Ok(LoadedInput::from_file(data, path))
            }
        }
    }
}

/// Input bytes plus where they came from.
///
/// `source` is set only when the bytes were read from disk; it drives
/// output placement and timestamp metadata. `hint` only feeds detection.
#[derive(Debug)]
pub(crate) struct LoadedInput {
    pub data: Vec<u8>,
    pub hint: Option<PathBuf>,
    pub source: Option<PathBuf>,
}

impl LoadedInput {
    fn from_file(data: Vec<u8>, path: PathBuf) -> Self {
        Self {
            data,
            hint: None,
            source: Some(path),
        }
    }

    /// Path used for format detection: the explicit hint, else the source file.
    pub fn detection_path(&self) -> Option<&Path> {
        self.hint.as_deref().or(self.source.as_deref())
    }
}

impl From<Vec<u8>> for ConversionInput {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes { data, hint: None }
    }
}

impl From<&[u8]> for ConversionInput {
    fn from(data: &[u8]) -> Self {
        Self::Bytes {
            data: data.to_vec(),
            hint: None,
        }
    }
}

impl From<PathBuf> for ConversionInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ConversionInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for ConversionInput {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

/// Outcome of one conversion.
///
/// A failed result carries no data and at least one error. A successful
/// result carries data, an output path, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    pub original_format: String,
    pub output_format: String,
    pub original_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u64>,
    pub processing_time_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataResult>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ConversionResult {
    /// A result still being filled in by the pipeline.
    pub(crate) fn pending(output_format: impl Into<String>) -> Self {
        Self {
            success: false,
            original_format: String::new(),
            output_format: output_format.into(),
            original_size: 0,
            output_size: None,
            processing_time_secs: 0.0,
            output_path: None,
            data: None,
            metadata: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Marks the result failed with the given error, dropping any data.
    pub(crate) fn fail(&mut self, error: impl ToString) {
        self.success = false;
        self.data = None;
        self.output_size = None;
        self.output_path = None;
        self.errors.push(error.to_string());
    }

    /// Marks the result successful with the given output.
    pub(crate) fn succeed(&mut self, data: Vec<u8>) {
        self.success = true;
        self.output_size = Some(data.len() as u64);
        self.data = Some(data);
    }
}
