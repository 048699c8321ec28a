//! Lossy JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::error::ProcessingError;
use crate::types::EncodedImage;

/// Map a `[0.0, 1.0]` quality onto the encoder's 1..=100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode an image as JPEG at `quality` (already validated to `[0.0, 1.0]`).
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn encode_jpeg(image: &DynamicImage, quality: f32) -> Result<EncodedImage, ProcessingError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality))
        .encode_image(&rgb)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;

    Ok(EncodedImage::new(bytes, width, height))
}
