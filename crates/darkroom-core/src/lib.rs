//! Darkroom Core - image compression, thumbnails and metadata.
//!
//! Darkroom re-encodes images to bounded JPEGs, cuts square thumbnails and
//! reads basic geometry. Heavy work runs on a dedicated worker thread when one
//! can be started, and inline otherwise; callers see the same results either
//! way.
//!
//! # Architecture
//!
//! ```text
//! ImageInput → ImageProcessor → Executor ─┬─ Offloaded: decode → TaskDispatcher → worker thread
//!                                         └─ Fallback:  decode → handlers (inline)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use darkroom_core::{CompressOptions, Config, ImageInput, ImageProcessor};
//!
//! #[tokio::main]
//! async fn main() -> darkroom_core::Result<()> {
//!     let config = Config::load()?;
//!     let processor = ImageProcessor::new(&config)?;
//!
//!     let input = ImageInput::from_path("./photo.png".as_ref()).await?;
//!     let result = processor.process_image(&input, &CompressOptions::default()).await?;
//!     println!("{} saved {}%", result.artifact.name, result.compression_ratio);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::{BackendMode, Config};
pub use error::{ConfigError, DarkroomError, ProcessingError, ProcessingResult, Result};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{CompressOptions, ImageProcessor, ProgressEvent};
pub use types::{
    ExecutionPath, ImageInput, ImageMetadata, ProcessedImage, ThumbnailArtifact,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_processor_from_default_config() {
        let processor = ImageProcessor::new(&Config::default()).unwrap();
        assert_eq!(processor.thumbnail_size(), 150);
    }
}
