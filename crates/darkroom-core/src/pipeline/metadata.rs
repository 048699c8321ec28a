//! Metadata: dimensions, aspect ratio and megapixels.

use crate::geometry::{aspect_ratio, megapixels};
use crate::types::ImageMetadata;

use super::decode::DecodedImage;

/// Describe a decoded image. Decoded images always have non-zero dimensions.
pub fn metadata(image: &DecodedImage) -> ImageMetadata {
    ImageMetadata {
        width: image.width,
        height: image.height,
        aspect_ratio: aspect_ratio(image.width, image.height),
        megapixels: megapixels(image.width, image.height),
    }
}
