//! Bounded-concurrency batch runner.

use futures::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use super::error::BatchError;
use super::expand::expand_patterns;
use super::options::BatchConversionOptions;
use super::types::{BatchConversionResult, BatchFileError};
use crate::engine::ConversionEngine;
use crate::metrics;

impl ConversionEngine {
    /// Converts every file matched by `patterns` (then `options.patterns`).
    ///
    /// At most `options.max_concurrency` conversions run at once. Ordinary
    /// failures are collected as results. A hard error (a malformed call or a
    /// panicking task) is recorded; with `continue_on_error == false` it also
    /// stops the batch: queued files never start, in-flight files finish, and
    /// the error is returned.
    pub async fn convert_batch<S: AsRef<str>>(
        &self,
        patterns: &[S],
        output_format: &str,
        options: &BatchConversionOptions,
    ) -> Result<BatchConversionResult, BatchError> {
        let started = Instant::now();
        options.validate()?;

        let files = plan_batch(patterns, options)?;
        let total = files.len();

        info!(
            patterns = patterns.len() + options.patterns.len(),
            files = total,
            output_format = %output_format,
            max_concurrency = options.max_concurrency,
            "Starting batch"
        );

        let mut result = BatchConversionResult {
            total_files: total,
            ..Default::default()
        };

        let semaphore = Arc::new(Semaphore::new(options.max_concurrency));
        let mut tasks = FuturesUnordered::new();

        for file in files {
            let engine = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let conversion = options.conversion.clone();
            let output_format = output_format.to_string();
            let path = file.clone();

            let handle = tokio::spawn(async move {
                // a closed semaphore means the batch was aborted
                let _permit = semaphore.acquire_owned().await.ok()?;
                Some(engine.convert(path, &output_format, &conversion).await)
            });
            tasks.push(async move { (file, handle.await) });
        }

        let mut completed = 0;
        let mut aborted: Option<BatchError> = None;

        while let Some((file, joined)) = tasks.next().await {
            let outcome = match joined {
                Ok(None) => continue,
                Ok(Some(Ok(converted))) => Ok(converted),
                Ok(Some(Err(e))) => Err(e.to_string()),
                Err(e) => Err(describe_join_error(e)),
            };
            completed += 1;

            match outcome {
                Ok(converted) => {
                    let success = converted.success;
                    if success {
                        result.success_count += 1;
                        metrics::BATCH_FILES.with_label_values(&["success"]).inc();
                    } else {
                        warn!(file = %file.display(), errors = ?converted.errors, "File failed");
                        metrics::BATCH_FILES
                            .with_label_values(&["soft_failure"])
                            .inc();
                    }
                    if let Some(observer) = &options.observer {
                        observer.on_progress(completed, total, &file, success);
                    }
                    result.results.push(converted);
                }
                Err(message) => {
                    error!(file = %file.display(), error = %message, "Hard error in batch");
                    metrics::BATCH_FILES.with_label_values(&["hard_error"]).inc();
                    if let Some(observer) = &options.observer {
                        observer.on_error(&file, &message);
                    }
                    result.errors.push(BatchFileError {
                        file: file.clone(),
                        error: message.clone(),
                    });

                    if !options.continue_on_error && aborted.is_none() {
                        semaphore.close();
                        aborted = Some(BatchError::Aborted { file, message });
                    }
                }
            }
        }

        result.error_count = result.errors.len();
        result.total_time_ms = started.elapsed().as_millis() as u64;

        if let Some(err) = aborted {
            warn!(
                completed,
                total,
                error = %err,
                "Batch aborted"
            );
            return Err(err);
        }

        info!(
            total,
            success = result.success_count,
            soft_failures = result.soft_failure_count(),
            hard_errors = result.error_count,
            duration_ms = result.total_time_ms,
            "Batch finished"
        );
        Ok(result)
    }
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return format!("Conversion task failed: {err}");
    }
    let payload = err.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("Conversion task panicked: {detail}")
}

/// Files a batch would convert, without converting them.
pub fn plan_batch<S: AsRef<str>>(
    patterns: &[S],
    options: &BatchConversionOptions,
) -> Result<Vec<PathBuf>, BatchError> {
    let all_patterns: Vec<&str> = patterns
        .iter()
        .map(|p| p.as_ref())
        .chain(options.patterns.iter().map(String::as_str))
        .collect();
    expand_patterns(&all_patterns)
}
