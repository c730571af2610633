//! Types for the batch module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::ConversionResult;

/// A hard error recorded for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFileError {
    pub file: PathBuf,
    pub error: String,
}

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConversionResult {
    /// Number of glob matches, duplicates included.
    pub total_files: usize,
    /// Results with `success == true`.
    pub success_count: usize,
    /// Hard errors, one per entry in `errors`.
    pub error_count: usize,
    /// Every well-formed result (successes and soft failures), in completion order.
    pub results: Vec<ConversionResult>,
    pub errors: Vec<BatchFileError>,
    pub total_time_ms: u64,
}

impl BatchConversionResult {
    /// Results that completed but reported `success == false`.
    pub fn soft_failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    /// Whether every matched file converted successfully.
    pub fn is_complete_success(&self) -> bool {
        self.success_count == self.total_files
    }
}

/// Notification emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// A file finished with a result, successful or not.
    Progress {
        completed: usize,
        total: usize,
        file: PathBuf,
        success: bool,
    },
    /// A file hit a hard error.
    Error { file: PathBuf, error: String },
}
