//! Compress: downscale to fit within bounds, then re-encode.

use image::imageops::FilterType;

use crate::error::ProcessingError;
use crate::geometry::contained_size;
use crate::types::EncodedImage;

use super::decode::DecodedImage;
use super::encode::encode_jpeg;
use super::operation::CompressParams;

/// Resample `image` to fit within the bounds and encode it at the given quality.
///
/// Images already inside the bounds keep their size and are only re-encoded.
pub fn compress(
    image: DecodedImage,
    params: &CompressParams,
    filter: FilterType,
) -> Result<EncodedImage, ProcessingError> {
    params.validate()?;

    let (width, height) = contained_size(
        image.width,
        image.height,
        params.max_width,
        params.max_height,
    );

    let resized = if (width, height) == (image.width, image.height) {
        image.image
    } else {
        image.image.resize_exact(width, height, filter)
    };

    encode_jpeg(&resized, params.quality)
}
