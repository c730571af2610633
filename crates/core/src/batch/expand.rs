//! Glob pattern expansion.

use std::path::PathBuf;
use tracing::{debug, warn};

use super::error::BatchError;

/// Expands each pattern in order into regular files.
///
/// `**` matches recursively. Matches of one pattern come out sorted; patterns
/// are concatenated, so overlapping patterns yield duplicates. Entries that
/// cannot be read are skipped. No match is not an error.
pub fn expand_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let entries = glob::glob(pattern).map_err(|e| BatchError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let before = files.len();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => warn!(pattern = %pattern, error = %e, "Skipping unreadable glob entry"),
            }
        }
        debug!(pattern = %pattern, matched = files.len() - before, "Expanded pattern");
    }

    Ok(files)
}
