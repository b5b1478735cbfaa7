//! Image validation for uploaded thumbnails.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::error::StorageError;

/// Allowed image formats for recipe thumbnails.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum size of a single thumbnail (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Check size and format from the magic bytes.
///
/// Returns the file extension to store the image under (e.g. "jpg").
pub fn validate_image(data: &[u8]) -> Result<&'static str, StorageError> {
    if data.len() > MAX_FILE_SIZE {
        return Err(StorageError::UnsupportedImage(format!(
            "Image too large: {} bytes (max {})",
            data.len(),
            MAX_FILE_SIZE
        )));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| StorageError::UnsupportedImage(format!("Failed to read image: {}", e)))?;

    let format = reader
        .format()
        .ok_or_else(|| StorageError::UnsupportedImage("Could not detect image format".into()))?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(StorageError::UnsupportedImage(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        )));
    }

    Ok(format.extensions_str().first().copied().unwrap_or("img"))
}
