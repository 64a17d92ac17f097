//! Reading sky images from disk.

use std::path::Path;

use image::{DynamicImage, ImageReader};

use crate::error::{GeoCropError, Result};

/// Extensions accepted by the batch walker, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif"];

/// Returns true if `path` has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Decode the image at `path`.
///
/// The format is guessed from the file content, falling back to the
/// extension.
///
/// # Errors
///
/// Returns `GeoCropError::Io` if the file cannot be opened and
/// `GeoCropError::ImageDecode` if the content is unreadable or corrupt.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let decode_error = |reason: String| GeoCropError::ImageDecode {
        path: path.to_path_buf(),
        reason,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| GeoCropError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?;

    reader.decode().map_err(|e| decode_error(e.to_string()))
}
