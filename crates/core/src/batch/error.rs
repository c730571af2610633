//! Error types for batch conversions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that terminate a whole batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A glob pattern could not be parsed.
    #[error("Invalid glob pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The batch options are malformed.
    #[error("Invalid batch options: {0}")]
    InvalidOptions(String),

    /// A hard error stopped the batch because `continue_on_error` is false.
    #[error("Batch aborted at {}: {message}", file.display())]
    Aborted { file: PathBuf, message: String },
}
