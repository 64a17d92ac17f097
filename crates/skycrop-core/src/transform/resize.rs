//! Image resizing for the upscale step.
//!
//! Uses the `image` crate's resampling filters. All functions return new
//! images without modifying the input.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{GeoCropError, Result};

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, blocky when upscaling).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    Bilinear,
    /// Catmull-Rom cubic interpolation.
    CatmullRom,
    /// Lanczos3 interpolation (slower, highest quality).
    #[default]
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `GeoCropError::InvalidConfig` if either target dimension is zero.
pub fn resize(
    image: &DynamicImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DynamicImage> {
    if width == 0 || height == 0 {
        return Err(GeoCropError::InvalidConfig(format!(
            "cannot resize to {}x{}",
            width, height
        )));
    }

    // Fast path: if dimensions match, just clone
    if image.width() == width && image.height() == height {
        return Ok(image.clone());
    }

    Ok(image.resize_exact(width, height, filter.to_image_filter()))
}

/// Enlarge both dimensions by an integer `factor`.
///
/// A factor of 1 returns an identical copy; the image is never shrunk.
///
/// # Errors
///
/// Returns `GeoCropError::InvalidConfig` for a zero factor or if the target
/// size does not fit in `u32`.
pub fn upscale(image: &DynamicImage, factor: u32, filter: FilterType) -> Result<DynamicImage> {
    if factor == 0 {
        return Err(GeoCropError::InvalidConfig(
            "scale factor must be at least 1".to_string(),
        ));
    }

    let (width, height) = (image.width(), image.height());
    let target = width.checked_mul(factor).zip(height.checked_mul(factor));
    let Some((new_width, new_height)) = target else {
        return Err(GeoCropError::InvalidConfig(format!(
            "{}x{} scaled by {} overflows",
            width, height, factor
        )));
    };

    resize(image, new_width, new_height, filter)
}
