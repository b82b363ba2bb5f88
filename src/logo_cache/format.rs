//! Image validation and PNG normalization for fetched logos

use image::ImageFormat;
use std::io::Cursor;

use crate::errors::{FetchError, FetchResult};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Empty `IEND` chunk (length, type, CRC) that closes every complete PNG
pub const PNG_TRAILER: [u8; 12] = [
    0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub fn has_png_signature(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

pub fn has_png_trailer(data: &[u8]) -> bool {
    data.ends_with(&PNG_TRAILER)
}

/// Validate fetched bytes and return them as PNG.
///
/// PNG input that decodes cleanly and ends at its `IEND` chunk is stored
/// as-is; anything else that decodes is re-encoded.
pub fn normalize_to_png(data: &[u8]) -> FetchResult<Vec<u8>> {
    if data.is_empty() {
        return Err(FetchError::invalid_image("empty response"));
    }

    let format = image::guess_format(data)
        .map_err(|e| FetchError::invalid_image(format!("unrecognized format: {e}")))?;

    let img = image::load_from_memory_with_format(data, format)
        .map_err(|e| FetchError::invalid_image(format!("failed to decode {format:?}: {e}")))?;

    // Trailing bytes after IEND would make the stored file look truncated
    if format == ImageFormat::Png && has_png_trailer(data) {
        return Ok(data.to_vec());
    }

    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| FetchError::invalid_image(format!("failed to convert to PNG: {e}")))?;

    Ok(png_bytes)
}

#[cfg(test)]
pub(crate) fn sample_image(format: ImageFormat) -> Vec<u8> {
    sample_image_sized(format, 4)
}

#[cfg(test)]
pub(crate) fn sample_image_sized(format: ImageFormat, size: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        size,
        size,
        image::Rgb([200, 30, 30]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}
