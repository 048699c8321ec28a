//! Operations, their parameters, and the handler seam that executes them.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::OperationOutput;

use super::decode::DecodedImage;
use super::{compress, metadata, thumbnail};

/// The three operations, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Compress,
    Thumbnail,
    Metadata,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Compress => "compress",
            OperationKind::Thumbnail => "thumbnail",
            OperationKind::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compress" => Ok(OperationKind::Compress),
            "thumbnail" => Ok(OperationKind::Thumbnail),
            "metadata" => Ok(OperationKind::Metadata),
            other => Err(ProcessingError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Parameters of the Compress operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressParams {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality in [0.0, 1.0]; anything else is rejected
    pub quality: f32,
}

impl CompressParams {
    pub fn validate(&self) -> ProcessingResult<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ProcessingError::Validation(format!(
                "max_width and max_height must be > 0 (got {}x{})",
                self.max_width, self.max_height
            )));
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(ProcessingError::Validation(format!(
                "quality must be between 0.0 and 1.0 (got {})",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Parameters of the Thumbnail operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailParams {
    /// Square edge in pixels
    pub size: u32,
}

impl ThumbnailParams {
    pub fn validate(&self) -> ProcessingResult<()> {
        if self.size == 0 || self.size > thumbnail::MAX_THUMBNAIL_SIZE {
            return Err(ProcessingError::Validation(format!(
                "thumbnail size must be between 1 and {} (got {})",
                thumbnail::MAX_THUMBNAIL_SIZE,
                self.size
            )));
        }
        Ok(())
    }
}

/// A fully-typed operation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Compress(CompressParams),
    Thumbnail(ThumbnailParams),
    Metadata,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Compress(_) => OperationKind::Compress,
            Operation::Thumbnail(_) => OperationKind::Thumbnail,
            Operation::Metadata => OperationKind::Metadata,
        }
    }

    pub fn validate(&self) -> ProcessingResult<()> {
        match self {
            Operation::Compress(params) => params.validate(),
            Operation::Thumbnail(params) => params.validate(),
            Operation::Metadata => Ok(()),
        }
    }

    /// Parameters as the JSON object carried on the wire.
    pub fn parameters(&self) -> Value {
        let value = match self {
            Operation::Compress(params) => serde_json::to_value(params),
            Operation::Thumbnail(params) => serde_json::to_value(params),
            Operation::Metadata => Ok(Value::Object(Default::default())),
        };
        value.unwrap_or_else(|_| Value::Object(Default::default()))
    }

    /// Rebuild an operation from its wire name and parameter object.
    ///
    /// Unknown names yield `UnsupportedOperation`; missing or mistyped
    /// parameters yield `Validation`.
    pub fn from_wire(kind: &str, parameters: Value) -> ProcessingResult<Self> {
        let invalid = |e: serde_json::Error| {
            ProcessingError::Validation(format!("bad {kind} parameters: {e}"))
        };
        match kind.parse::<OperationKind>()? {
            OperationKind::Compress => Ok(Operation::Compress(
                serde_json::from_value(parameters).map_err(invalid)?,
            )),
            OperationKind::Thumbnail => Ok(Operation::Thumbnail(
                serde_json::from_value(parameters).map_err(invalid)?,
            )),
            OperationKind::Metadata => Ok(Operation::Metadata),
        }
    }
}

/// Executes one operation against one decoded image.
///
/// The worker backend owns a handler and calls it for every request it
/// receives; implementations must not retain the image.
pub trait OperationHandler: Send + 'static {
    fn handle(&self, operation: &Operation, image: DecodedImage)
        -> ProcessingResult<OperationOutput>;
}

/// The stock handlers, parameterized by resampling filter.
#[derive(Debug, Clone, Copy)]
pub struct ImageHandlers {
    filter: FilterType,
}

impl ImageHandlers {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Handlers used on the worker thread.
    pub fn offloaded() -> Self {
        Self::new(FilterType::Lanczos3)
    }

    /// Handlers used inline on the caller's thread; cheaper resampling.
    pub fn inline() -> Self {
        Self::new(FilterType::Triangle)
    }
}

impl OperationHandler for ImageHandlers {
    fn handle(
        &self,
        operation: &Operation,
        image: DecodedImage,
    ) -> ProcessingResult<OperationOutput> {
        match operation {
            Operation::Compress(params) => {
                compress::compress(image, params, self.filter).map(OperationOutput::Encoded)
            }
            Operation::Thumbnail(params) => {
                thumbnail::thumbnail(image, params, self.filter).map(OperationOutput::Encoded)
            }
            Operation::Metadata => Ok(OperationOutput::Metadata(metadata::metadata(&image))),
        }
    }
}
