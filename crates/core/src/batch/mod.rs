//! Batch orchestration: many single conversions under a concurrency cap.
//!
//! Glob patterns are expanded into a file list, every file goes through
//! `ConversionEngine::convert`, and the outcomes are aggregated. A semaphore
//! bounds how many conversions are in flight. Progress and errors are
//! reported through a [`BatchObserver`] called from the aggregation loop.
//!
//! # Example
//!
//! ```ignore
//! use fileforge_core::batch::{BatchConversionOptions, ChannelObserver};
//!
//! let (observer, mut events) = ChannelObserver::channel();
//! let options = BatchConversionOptions::default()
//!     .with_max_concurrency(4)
//!     .with_observer(Arc::new(observer));
//!
//! let result = engine.convert_batch(&["docs/**/*.md"], "html", &options).await?;
//! println!("{}/{} converted", result.success_count, result.total_files);
//! ```

mod error;
mod expand;
mod observer;
mod options;
mod runner;
mod types;

pub use error::BatchError;
pub use expand::expand_patterns;
pub use observer::{BatchObserver, ChannelObserver};
pub use options::BatchConversionOptions;
pub use runner::plan_batch;
pub use types::{BatchConversionResult, BatchEvent, BatchFileError};
