//! Latitude/longitude to pixel mapping for a fixed-extent image.
//!
//! The imagery is assumed to cover a rectangular lon/lat extent mapped
//! linearly onto the full raster, north at row 0:
//!
//! ```text
//! x = (lon - min_lon) / (max_lon - min_lon) * width
//! y = (max_lat - lat) / (max_lat - min_lat) * height
//! ```
//!
//! A region of interest is a square of `2 * half_side_km` around a plant,
//! converted to degrees with a spherical approximation: one degree of
//! latitude is `km_per_degree` km, one degree of longitude is
//! `km_per_degree * cos(lat)` km.

use crate::config::{GeoCropConfig, ProjectionBounds};
use crate::geocode::PlantRecord;

/// Linear projection of `bounds` onto a `width` x `height` raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    bounds: ProjectionBounds,
    width: f64,
    height: f64,
}

impl Projection {
    pub fn new(bounds: ProjectionBounds, width: u32, height: u32) -> Self {
        Self {
            bounds,
            width: width as f64,
            height: height as f64,
        }
    }

    /// Map a geographic position to fractional pixel coordinates `(x, y)`.
    ///
    /// Positions outside the extent map outside `[0, width] x [0, height]`.
    pub fn to_pixel(&self, lat: f64, lon: f64) -> (f64, f64) {
        let b = &self.bounds;
        let x = (lon - b.min_lon) / (b.max_lon - b.min_lon) * self.width;
        let y = (b.max_lat - lat) / (b.max_lat - b.min_lat) * self.height;
        (x, y)
    }
}

/// Degree extents `(d_lat, d_lon)` of `half_side_km` at latitude `lat`.
pub fn degree_deltas(lat: f64, half_side_km: f64, km_per_degree: f64) -> (f64, f64) {
    let d_lat = half_side_km / km_per_degree;
    let d_lon = half_side_km / (km_per_degree * lat.to_radians().cos());
    (d_lat, d_lon)
}

/// Axis-aligned box in fractional pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl PixelBounds {
    /// Smallest box containing all `points`.
    pub fn enclosing(points: &[(f64, f64)]) -> Self {
        let mut bounds = PixelBounds {
            x_min: f64::INFINITY,
            y_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_max: f64::NEG_INFINITY,
        };
        for &(x, y) in points {
            bounds.x_min = bounds.x_min.min(x);
            bounds.y_min = bounds.y_min.min(y);
            bounds.x_max = bounds.x_max.max(x);
            bounds.y_max = bounds.y_max.max(y);
        }
        bounds
    }

    /// Pixel box of the region of interest around `plant`.
    ///
    /// The four corners (NW, NE, SW, SE) of the geographic square are
    /// projected individually and enclosed.
    pub fn around(projection: &Projection, plant: &PlantRecord, config: &GeoCropConfig) -> Self {
        let (d_lat, d_lon) =
            degree_deltas(plant.latitude, config.half_side_km, config.km_per_degree);

        let north = plant.latitude + d_lat;
        let south = plant.latitude - d_lat;
        let west = plant.longitude - d_lon;
        let east = plant.longitude + d_lon;

        Self::enclosing(&[
            projection.to_pixel(north, west),
            projection.to_pixel(north, east),
            projection.to_pixel(south, west),
            projection.to_pixel(south, east),
        ])
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }
}
