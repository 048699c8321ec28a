//! Core data types for Darkroom.
//!
//! Inputs flow in as [`ImageInput`], operations produce an [`OperationOutput`],
//! and the processor assembles those into caller-facing artifacts.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pipeline::OperationKind;

/// MIME type of every encoded artifact.
pub const OUTPUT_MIME: &str = "image/jpeg";

/// Raw, still-encoded image input (a file's contents or an in-memory blob).
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Display name, usually the file name
    pub name: String,
    /// Encoded image bytes
    pub bytes: Vec<u8>,
}

impl ImageInput {
    /// Wrap an in-memory blob.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read an input from disk.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self { name, bytes })
    }

    /// Size of the encoded input in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Name for the re-encoded artifact: same stem, `.jpg` extension.
    pub fn output_name(&self) -> String {
        let stem = Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("image");
        format!("{stem}.jpg")
    }
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An encoded raster produced by the Compress or Thumbnail operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// JPEG bytes
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Length of `bytes`
    pub byte_size: u64,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        let byte_size = bytes.len() as u64;
        Self {
            bytes,
            width,
            height,
            byte_size,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

/// Result of the Metadata operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// `width / height`
    pub aspect_ratio: f64,
    /// Pixel count in millions, two decimals
    pub megapixels: f64,
}

/// Output of one operation, discriminated by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationOutput {
    /// Compress or Thumbnail result
    Encoded(EncodedImage),
    /// Metadata result
    Metadata(ImageMetadata),
}

impl OperationOutput {
    /// The encoded image, if this output carries one.
    pub fn into_encoded(self) -> Option<EncodedImage> {
        match self {
            Self::Encoded(image) => Some(image),
            Self::Metadata(_) => None,
        }
    }

    /// The metadata, if this output carries it.
    pub fn into_metadata(self) -> Option<ImageMetadata> {
        match self {
            Self::Metadata(metadata) => Some(metadata),
            Self::Encoded(_) => None,
        }
    }

    /// Whether this output is a valid answer to an operation of `kind`.
    pub fn matches(&self, kind: OperationKind) -> bool {
        match self {
            Self::Encoded(_) => matches!(kind, OperationKind::Compress | OperationKind::Thumbnail),
            Self::Metadata(_) => kind == OperationKind::Metadata,
        }
    }
}

/// Which executor ran an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPath {
    /// The dedicated worker thread
    Offloaded,
    /// Inline on the caller's thread
    Fallback,
}

impl std::fmt::Display for ExecutionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionPath::Offloaded => write!(f, "offloaded"),
            ExecutionPath::Fallback => write!(f, "fallback"),
        }
    }
}

/// The re-encoded file handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Output file name (`<stem>.jpg`)
    pub name: String,
    /// MIME type of `image.bytes`
    pub mime_type: String,
    #[serde(flatten)]
    pub image: EncodedImage,
}

/// Complete output of `process_image`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub artifact: Artifact,
    /// Encoded input size in bytes
    pub original_size: u64,
    /// Encoded output size in bytes
    pub processed_size: u64,
    pub dimensions: Dimensions,
    /// Size reduction as a percentage, one decimal
    pub compression_ratio: f64,
    pub executed_by: ExecutionPath,
}

/// A square thumbnail with a displayable reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailArtifact {
    /// JPEG bytes
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Edge length in pixels
    pub size: u32,
    /// `data:image/jpeg;base64,...` URL
    pub data_url: String,
    pub executed_by: ExecutionPath,
}

/// Size reduction from `original` to `processed` bytes as a percentage,
/// rounded to one decimal. Negative when the output grew.
pub fn compression_ratio(original: u64, processed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let ratio = (original as f64 - processed as f64) / original as f64 * 100.0;
    (ratio * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_ratio() {
        assert_eq!(compression_ratio(1_000_000, 600_000), 40.0);
        assert_eq!(compression_ratio(3, 2), 33.3);
        assert_eq!(compression_ratio(100, 150), -50.0);
        assert_eq!(compression_ratio(0, 10), 0.0);
    }

    #[test]
    fn test_output_name_replaces_extension() {
        assert_eq!(ImageInput::new("IMG_0042.PNG", vec![]).output_name(), "IMG_0042.jpg");
        assert_eq!(ImageInput::new("scan", vec![]).output_name(), "scan.jpg");
        assert_eq!(ImageInput::new("", vec![]).output_name(), "image.jpg");
    }

    #[test]
    fn test_output_matches_kind() {
        let encoded = OperationOutput::Encoded(EncodedImage::new(vec![1, 2, 3], 2, 2));
        assert!(encoded.matches(OperationKind::Thumbnail));
        assert!(!encoded.matches(OperationKind::Metadata));
        assert_eq!(encoded.into_encoded().map(|e| e.byte_size), Some(3));
    }

    #[tokio::test]
    async fn test_input_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"abc").unwrap();

        let input = ImageInput::from_path(&path).await.unwrap();
        assert_eq!(input.name, "photo.png");
        assert_eq!(input.size(), 3);
    }
}
