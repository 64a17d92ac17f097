//! Immutable parameters for the crop pipeline.
//!
//! The projection extent, region radius and upscale factor used to be fixed
//! constants of the imagery source. They are collected here so that one
//! [`GeoCropConfig`] can be built per region (or per test) and passed by
//! reference into the transformer and the batch runner.
//!
//! A configuration can be loaded from a JSON file in which every field is
//! optional:
//!
//! ```json
//! {
//!     "bounds": { "min_lon": 80.0, "max_lon": 115.0, "min_lat": 0.0, "max_lat": 30.0 },
//!     "half_side_km": 50.0,
//!     "scale_factor": 25,
//!     "filter": "lanczos3",
//!     "match_policy": "reject_conflicting"
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{GeoCropError, Result};
use crate::geocode::TableSource;
use crate::transform::FilterType;

/// Geographic extent covered by the full image, mapped linearly onto pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Default for ProjectionBounds {
    fn default() -> Self {
        Self {
            min_lon: 80.0,
            max_lon: 115.0,
            min_lat: 0.0,
            max_lat: 30.0,
        }
    }
}

impl ProjectionBounds {
    pub fn validate(&self) -> Result<()> {
        let values = [self.min_lon, self.max_lon, self.min_lat, self.max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeoCropError::InvalidConfig(
                "projection bounds must be finite".to_string(),
            ));
        }
        if self.min_lon >= self.max_lon {
            return Err(GeoCropError::InvalidConfig(format!(
                "min_lon ({}) must be less than max_lon ({})",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat >= self.max_lat {
            return Err(GeoCropError::InvalidConfig(format!(
                "min_lat ({}) must be less than max_lat ({})",
                self.min_lat, self.max_lat
            )));
        }
        Ok(())
    }
}

/// Header names of the plant reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumns {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self {
            name: "TEN_NM".to_string(),
            latitude: "VIDO".to_string(),
            longitude: "KINHDO".to_string(),
        }
    }
}

/// How to pick one record when several rows share a plant name.
///
/// Rows with identical coordinates are never ambiguous; the policy only
/// applies when the matching rows disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Use the first matching row in file order.
    First,
    /// Use the last matching row in file order.
    Last,
    /// Fail with [`GeoCropError::AmbiguousPlant`].
    #[default]
    RejectConflicting,
}

/// Parameters of the plant-centred crop and upscale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoCropConfig {
    /// Extent of the image projection.
    pub bounds: ProjectionBounds,
    /// Half the side of the square region of interest, in kilometres.
    pub half_side_km: f64,
    /// Kilometres per degree of latitude (spherical approximation).
    pub km_per_degree: f64,
    /// Integer upscale applied to both dimensions after cropping.
    pub scale_factor: u32,
    /// Resampling filter for the upscale.
    pub filter: FilterType,
    /// Selection rule for duplicate plant names.
    pub match_policy: MatchPolicy,
    /// Reference table header names.
    pub columns: TableColumns,
}

impl Default for GeoCropConfig {
    fn default() -> Self {
        Self {
            bounds: ProjectionBounds::default(),
            half_side_km: 50.0,
            km_per_degree: 111.0,
            scale_factor: 25,
            filter: FilterType::Lanczos3,
            match_policy: MatchPolicy::default(),
            columns: TableColumns::default(),
        }
    }
}

impl GeoCropConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GeoCropError::io(path, e))?;
        let reader = BufReader::new(file);

        let config: GeoCropConfig = serde_json::from_reader(reader).map_err(|e| {
            GeoCropError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;

        if !(self.half_side_km.is_finite() && self.half_side_km > 0.0) {
            return Err(GeoCropError::InvalidConfig(format!(
                "half_side_km must be positive, got {}",
                self.half_side_km
            )));
        }
        if !(self.km_per_degree.is_finite() && self.km_per_degree > 0.0) {
            return Err(GeoCropError::InvalidConfig(format!(
                "km_per_degree must be positive, got {}",
                self.km_per_degree
            )));
        }
        if self.scale_factor == 0 {
            return Err(GeoCropError::InvalidConfig(
                "scale_factor must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// One batch run: where images come from, where they go, and for which plant.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub plant_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub table: TableSource,
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(GeoCropError::InvalidConfig(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}
