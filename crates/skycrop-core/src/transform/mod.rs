//! Image transformation operations: square cropping and upscaling.
//!
//! # Transform Order
//!
//! For each image:
//! 1. Plan a square crop around the plant ([`plan_square_crop`])
//! 2. Crop, or keep the whole image if the square does not fit
//! 3. Upscale by the configured integer factor ([`upscale`])
//!
//! # Coordinate System
//!
//! - Crop regions are in integer pixels
//! - Origin is top-left corner

mod crop;
mod resize;

pub use crop::{apply_crop, plan_square_crop, CropPlan, CropRegion};
pub use resize::{resize, upscale, FilterType};
