//! Prometheus metrics for conversions and batches.
//!
//! Metrics are registered in a crate-local registry on first use and can be
//! rendered in the Prometheus text format with [`gather_text`].

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Registry holding every fileforge metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileforge_conversions_total", "Total single-file conversions"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fileforge_conversion_duration_seconds",
            "Duration of single-file conversions",
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

/// Conversion failures by error kind.
pub static CONVERSION_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fileforge_conversion_errors_total",
            "Failed conversions by error kind",
        ),
        &["kind"],
    )
    .unwrap()
});

/// Conversions currently running.
pub static INFLIGHT_CONVERSIONS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fileforge_inflight_conversions",
        "Conversions currently in progress",
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batch files by outcome.
pub static BATCH_FILES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileforge_batch_files_total", "Files processed by batches"),
        &["outcome"], // "success", "soft_failure", "hard_error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(CONVERSION_ERRORS.clone()),
        Box::new(INFLIGHT_CONVERSIONS.clone()),
        Box::new(BATCH_FILES.clone()),
    ]
}

/// Encode all metrics as Prometheus text format.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Keeps the in-flight gauge raised while alive.
pub(crate) struct InflightGuard;

impl InflightGuard {
    pub(crate) fn new() -> Self {
        INFLIGHT_CONVERSIONS.inc();
        Self
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        INFLIGHT_CONVERSIONS.dec();
    }
}
