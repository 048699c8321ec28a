//! Image processing pipeline components.
//!
//! - **decode**: Validate and decode raw inputs
//! - **validate**: Pre-decode size and magic-byte checks
//! - **encode**: JPEG encoding
//! - **compress** / **thumbnail** / **metadata**: the operation handlers
//! - **operation**: Typed operations and the handler seam
//! - **progress**: Progress checkpoints
//! - **processor**: The facade that wires everything together

pub mod compress;
pub mod decode;
pub mod encode;
pub mod metadata;
pub mod operation;
pub mod processor;
pub mod progress;
pub mod thumbnail;
pub mod validate;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use operation::{
    CompressParams, ImageHandlers, Operation, OperationHandler, OperationKind, ThumbnailParams,
};
pub use processor::{CompressOptions, ImageProcessor};
pub use progress::ProgressEvent;
pub use thumbnail::{MAX_THUMBNAIL_SIZE, THUMBNAIL_QUALITY};
pub use validate::Validator;
