//! Image decoding with format detection, validation, and timeout support.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::ProcessingError;
use crate::types::ImageInput;

use super::validate::Validator;

/// Image decoder with configurable limits and timeout.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
    validator: Validator,
}

/// A decoded raster, owned by exactly one operation at a time.
///
/// Moving a `DecodedImage` into a backend request hands the pixels over;
/// the caller keeps nothing that aliases them.
#[derive(Debug)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Size of the encoded source in bytes
    pub source_size: u64,
}

impl DecodedImage {
    /// Wrap an already-decoded raster.
    pub fn from_image(image: DynamicImage, format: ImageFormat) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            format,
            width,
            height,
            source_size: 0,
        }
    }
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            limits,
        }
    }

    /// Decode an input off the async runtime, bounded by the decode timeout.
    pub async fn decode(&self, input: &ImageInput) -> Result<DecodedImage, ProcessingError> {
        self.validator.validate(input)?;

        let bytes = input.bytes.clone();
        let name = input.name.clone();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || decode_bytes(bytes, &name)),
        )
        .await;

        let decoded = match decode_result {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => {
                return Err(ProcessingError::Decode {
                    name: input.name.clone(),
                    message: format!("Task join error: {}", e),
                })
            }
            Err(_) => {
                return Err(ProcessingError::Timeout {
                    stage: "decode".to_string(),
                    timeout_ms: self.limits.decode_timeout_ms,
                })
            }
        };

        self.validator
            .check_dimensions(input, decoded.width, decoded.height)?;
        Ok(decoded)
    }

    /// Decode on the current thread. Used by the fallback executor.
    pub fn decode_sync(&self, input: &ImageInput) -> Result<DecodedImage, ProcessingError> {
        self.validator.validate(input)?;
        let decoded = decode_bytes(input.bytes.clone(), &input.name)?;
        self.validator
            .check_dimensions(input, decoded.width, decoded.height)?;
        Ok(decoded)
    }
}

/// Decode raw bytes, detecting the format from content.
fn decode_bytes(bytes: Vec<u8>, name: &str) -> Result<DecodedImage, ProcessingError> {
    let source_size = bytes.len() as u64;
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ProcessingError::Decode {
            name: name.to_string(),
            message: format!("Cannot detect image format: {}", e),
        })?;
    let format = reader.format().ok_or_else(|| ProcessingError::Decode {
        name: name.to_string(),
        message: "Unknown image format".to_string(),
    })?;
    let image = reader.decode().map_err(|e| ProcessingError::Decode {
        name: name.to_string(),
        message: e.to_string(),
    })?;

    let mut decoded = DecodedImage::from_image(image, format);
    decoded.source_size = source_size;
    Ok(decoded)
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode a solid-color RGB image as PNG, for use as test input.
    pub(crate) fn png_input(name: &str, width: u32, height: u32) -> ImageInput {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([200, 120, 40]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        ImageInput::new(name, buffer.into_inner())
    }

    #[test]
    fn test_format_to_string() {
        assert_eq!(format_to_string(ImageFormat::Jpeg), "jpeg");
        assert_eq!(format_to_string(ImageFormat::Png), "png");
        assert_eq!(format_to_string(ImageFormat::WebP), "webp");
    }

    #[test]
    fn test_format_detected_by_content() {
        // PNG bytes under a .jpg name are still detected as PNG
        let input = png_input("misnamed.jpg", 8, 4);
        let decoded = ImageDecoder::new(LimitsConfig::default())
            .decode_sync(&input)
            .unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.width, decoded.height), (8, 4));
        assert_eq!(decoded.source_size, input.size());
    }

    #[tokio::test]
    async fn test_async_decode() {
        let input = png_input("photo.png", 32, 16);
        let decoded = ImageDecoder::new(LimitsConfig::default())
            .decode(&input)
            .await
            .unwrap();
        assert_eq!((decoded.width, decoded.height), (32, 16));
    }

    #[tokio::test]
    async fn test_truncated_input_is_decode_error() {
        let mut input = png_input("broken.png", 32, 32);
        input.bytes.truncate(20);
        let err = ImageDecoder::new(LimitsConfig::default())
            .decode(&input)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Decode { .. }));
    }

    #[test]
    fn test_dimension_limit_enforced() {
        let limits = LimitsConfig {
            max_image_dimension: 10,
            ..LimitsConfig::default()
        };
        let err = ImageDecoder::new(limits)
            .decode_sync(&png_input("big.png", 20, 5))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Validation(_)));
    }
}
