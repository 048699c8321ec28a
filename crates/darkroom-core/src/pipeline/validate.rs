//! Input validation before decoding.

use crate::config::LimitsConfig;
use crate::error::ProcessingError;
use crate::types::ImageInput;

/// Validates raw inputs before they are decoded.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Perform quick validation before full decode.
    ///
    /// Checks:
    /// - Input is not empty
    /// - Input size is within limits
    /// - Input starts with known image magic bytes
    pub fn validate(&self, input: &ImageInput) -> Result<(), ProcessingError> {
        if input.bytes.is_empty() {
            return Err(decode_error(input, "Input is empty"));
        }

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if input.size() > max_bytes {
            return Err(ProcessingError::Validation(format!(
                "{} is too large ({}MB > {}MB)",
                input.name,
                input.size() / (1024 * 1024),
                self.limits.max_file_size_mb
            )));
        }

        if !is_valid_image_header(&input.bytes) {
            return Err(decode_error(
                input,
                "Unrecognized image format (invalid magic bytes)",
            ));
        }

        Ok(())
    }

    /// Reject decoded images whose dimensions exceed the configured limit.
    pub fn check_dimensions(
        &self,
        input: &ImageInput,
        width: u32,
        height: u32,
    ) -> Result<(), ProcessingError> {
        let max_dim = self.limits.max_image_dimension;
        if width == 0 || height == 0 {
            return Err(decode_error(input, "Image has zero width or height"));
        }
        if width > max_dim || height > max_dim {
            return Err(ProcessingError::Validation(format!(
                "{} is too large ({width}x{height} > {max_dim})",
                input.name
            )));
        }
        Ok(())
    }
}

fn decode_error(input: &ImageInput, message: &str) -> ProcessingError {
    ProcessingError::Decode {
        name: input.name.clone(),
        message: message.to_string(),
    }
}

/// Check if the leading bytes match a format the decoder understands.
fn is_valid_image_header(header: &[u8]) -> bool {
    match header {
        // JPEG
        [0xFF, 0xD8, 0xFF, ..] => true,
        // PNG
        [0x89, b'P', b'N', b'G', ..] => true,
        // GIF
        [b'G', b'I', b'F', b'8', ..] => true,
        // WebP: RIFF....WEBP
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => true,
        // BMP
        [b'B', b'M', ..] => true,
        // TIFF, little- and big-endian, version 42
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => true,
        _ => false,
    }
}
