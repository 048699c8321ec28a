//! Thumbnail: center square crop, resample to a fixed square edge, JPEG encode.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::imageops::FilterType;

use crate::error::ProcessingError;
use crate::geometry::center_square_crop;
use crate::types::{EncodedImage, OUTPUT_MIME};

use super::decode::DecodedImage;
use super::encode::encode_jpeg;
use super::operation::ThumbnailParams;

/// Fixed encode quality for thumbnails; not caller-configurable.
pub const THUMBNAIL_QUALITY: f32 = 0.7;

/// Largest accepted thumbnail edge. The square raster is allocated before
/// encoding, so the edge is bounded up front.
pub const MAX_THUMBNAIL_SIZE: u32 = 4096;

/// Generate a `size x size` thumbnail from the largest centered square.
pub fn thumbnail(
    image: DecodedImage,
    params: &ThumbnailParams,
    filter: FilterType,
) -> Result<EncodedImage, ProcessingError> {
    params.validate()?;

    let crop = center_square_crop(image.width, image.height);
    let square = image
        .image
        .crop_imm(crop.x, crop.y, crop.edge, crop.edge)
        .resize_exact(params.size, params.size, filter);

    encode_jpeg(&square, THUMBNAIL_QUALITY)
}

/// Render encoded JPEG bytes as a `data:` URL.
pub fn data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", OUTPUT_MIME, BASE64.encode(bytes))
}
