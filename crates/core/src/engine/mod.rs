//! Conversion engine: drives one conversion through the pipeline.
//!
//! The pipeline for a single input is:
//! - Load: read the bytes (or take them as given)
//! - Detect: resolve the input format against the registered formats
//! - Validate: both formats must be known to some plugin
//! - Metadata: optional, failures become warnings
//! - Transform: plugin conversion, or a same-format optimization pass
//! - Persist: optional atomic write of the output
//!
//! # Example
//!
//! ```ignore
//! use fileforge_core::config::ForgeConfig;
//! use fileforge_core::engine::{ConversionEngine, ConversionOptions};
//!
//! let engine = ConversionEngine::with_default_plugins(ForgeConfig::default()).await?;
//!
//! let result = engine
//!     .convert("notes.md", "html", &ConversionOptions::default().with_output_dir("out"))
//!     .await?;
//!
//! if result.success {
//!     println!("Wrote {:?} in {:.3}s", result.output_path, result.processing_time_secs);
//! } else {
//!     eprintln!("Failed: {}", result.errors.join("; "));
//! }
//! ```

mod convert;
mod error;
mod options;
mod persist;
mod types;

pub use convert::ConversionEngine;
pub use error::{ConversionError, EngineError};
pub use options::{CompressionLevel, ConversionOptions, OptionBag};
pub use persist::{resolve_output_path, write_atomic};
pub use types::{ConversionInput, ConversionResult};
