//! Writing processed images to disk.
//!
//! The output format is inferred from the file extension, so an image keeps
//! the format it was read in.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat};

use crate::error::{GeoCropError, Result};

/// Convert `image` into something `format` can store.
///
/// JPEG holds only 8-bit gray or RGB, so alpha and high bit depths are
/// dropped for it. Other formats take the image as-is.
fn prepare_for(image: &DynamicImage, format: ImageFormat) -> Cow<'_, DynamicImage> {
    if format != ImageFormat::Jpeg {
        return Cow::Borrowed(image);
    }

    match image.color() {
        ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(image),
        ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8()))
        }
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}

/// Encode `image` to `path` in the format implied by its extension.
///
/// An existing file is overwritten. Encoding the same image twice produces
/// identical bytes.
///
/// # Errors
///
/// Returns `GeoCropError::ImageEncode` for an unknown extension or encoder
/// failure, and `GeoCropError::Io` if the file cannot be created or flushed.
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    let encode_error = |reason: String| GeoCropError::ImageEncode {
        path: path.to_path_buf(),
        reason,
    };

    let format = ImageFormat::from_path(path).map_err(|e| encode_error(e.to_string()))?;
    let prepared = prepare_for(image, format);

    let file = File::create(path).map_err(|e| GeoCropError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    prepared
        .write_to(&mut writer, format)
        .map_err(|e| encode_error(e.to_string()))?;
    writer.flush().map_err(|e| GeoCropError::io(path, e))?;

    Ok(())
}
