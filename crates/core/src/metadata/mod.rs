//! Metadata module: the fixed metadata result shape and the extractor service
//! the engine consults when `options.metadata` is set.

mod builtin;
mod traits;
mod types;

pub use builtin::BuiltinMetadataExtractor;
pub use traits::MetadataExtractor;
pub use types::{Dimensions, DocumentInfo, MetadataResult};
