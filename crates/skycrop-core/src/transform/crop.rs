//! Square crop planning around a plant.
//!
//! The planner turns the projected region of interest into a square pixel
//! region that lies fully inside the image:
//!
//! 1. `side = ceil(max(bbox_width, bbox_height))`
//! 2. If `side` exceeds either image dimension the crop is skipped and the
//!    caller keeps the whole image ([`CropPlan::Oversized`]).
//! 3. The square is centred on the bbox centre (top-left truncated toward
//!    zero), then shifted as a whole back into the image. Corrections are
//!    applied in order: left, right, top, bottom.
//! 4. If width and height still differ the square shrinks to the smaller of
//!    the two, anchored at its top-left corner.
//!
//! # Coordinate System
//!
//! - Pixel coordinates, origin at the top-left corner
//! - A region covers `[x, x + side) x [y, y + side)`

use image::DynamicImage;

use crate::projection::PixelBounds;

/// A square pixel region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, side: u32) -> Self {
        Self { x, y, side }
    }

    /// Exclusive right edge.
    pub fn x_max(&self) -> u32 {
        self.x + self.side
    }

    /// Exclusive bottom edge.
    pub fn y_max(&self) -> u32 {
        self.y + self.side
    }

    /// True if the region lies inside a `width` x `height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x_max() <= width && self.y_max() <= height
    }
}

/// Outcome of crop planning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropPlan {
    /// Crop to this square.
    Square(CropRegion),
    /// The required square does not fit; keep the whole image.
    Oversized {
        /// Required side in pixels (may be infinite near the poles).
        side: f64,
    },
}

/// Plan a square crop covering `bounds` inside a `width` x `height` image.
pub fn plan_square_crop(bounds: &PixelBounds, width: u32, height: u32) -> CropPlan {
    let required = bounds.width().max(bounds.height()).ceil();

    if !required.is_finite() || required > width as f64 || required > height as f64 {
        return CropPlan::Oversized { side: required };
    }

    // A degenerate box still yields a 1x1 crop
    let side = (required as i64).max(1);
    let (w, h) = (width as i64, height as i64);
    if side > w || side > h {
        return CropPlan::Oversized { side: side as f64 };
    }

    let (cx, cy) = bounds.center();
    let half = side as f64 / 2.0;

    let mut x_min = (cx - half).trunc() as i64;
    let mut y_min = (cy - half).trunc() as i64;
    let mut x_max = x_min + side;
    let mut y_max = y_min + side;

    if x_min < 0 {
        x_max -= x_min;
        x_min = 0;
    }
    if x_max > w {
        x_min -= x_max - w;
        x_max = w;
    }
    if y_min < 0 {
        y_max -= y_min;
        y_min = 0;
    }
    if y_max > h {
        y_min -= y_max - h;
        y_max = h;
    }

    let final_w = x_max - x_min;
    let final_h = y_max - y_min;
    let side = final_w.min(final_h);

    // side <= w and side <= h here, so the clamp never moves the region
    let x = x_min.clamp(0, w - side);
    let y = y_min.clamp(0, h - side);

    CropRegion::new(x as u32, y as u32, side as u32).into()
}

impl From<CropRegion> for CropPlan {
    fn from(region: CropRegion) -> Self {
        CropPlan::Square(region)
    }
}

/// Extract `region` from `image`.
///
/// The region must fit inside the image; out-of-range parts are clipped by
/// the image crate. The source image is not modified.
pub fn apply_crop(image: &DynamicImage, region: CropRegion) -> DynamicImage {
    // Fast path: full-frame crop returns a clone
    if region.x == 0
        && region.y == 0
        && region.side == image.width()
        && region.side == image.height()
    {
        return image.clone();
    }

    image.crop_imm(region.x, region.y, region.side, region.side)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
