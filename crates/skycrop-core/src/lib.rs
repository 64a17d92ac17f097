//! Skycrop Core - plant-centred sky image preprocessing
//!
//! This crate prepares time-series sky imagery for solar-power forecasting.
//! Given an archive of images laid out by date and time of day, it locates a
//! plant in a reference table, crops each image to a square covering a fixed
//! radius around the plant, upscales the crop, and writes it to a mirrored
//! output tree.
//!
//! # Module Structure
//!
//! - `config` - Immutable projection, radius and scale parameters
//! - `geocode` - Plant reference table loading and lookup
//! - `projection` - Lat/lon to pixel mapping and region-of-interest bounds
//! - `transform` - Square crop planning, cropping and upscaling
//! - `decode` / `encode` - Image file I/O
//! - `pipeline` - The per-image transformer
//! - `batch` - Date/time archive traversal with per-item results

pub mod batch;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod geocode;
pub mod pipeline;
pub mod projection;
pub mod transform;

pub use batch::{BatchRunner, BatchSummary, DateRange, ItemOutcome};
pub use config::{BatchConfig, GeoCropConfig, MatchPolicy, ProjectionBounds, TableColumns};
pub use error::{GeoCropError, Result};
pub use geocode::{PlantRecord, PlantTable, TableSource};
pub use pipeline::{normalize_plant_name, GeoCropper};
pub use transform::{CropPlan, CropRegion, FilterType};
