//! Error type shared by every stage of the crop pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while locating a plant or transforming an image.
///
/// An oversized crop region is not an error: the planner reports it as
/// [`CropPlan::Oversized`](crate::transform::CropPlan::Oversized) and the
/// full image is passed through.
#[derive(Debug, Error)]
pub enum GeoCropError {
    /// The plant reference table could not be found.
    #[error("Reference table not found (searched: {})", format_paths(.searched))]
    ReferenceTableMissing { searched: Vec<PathBuf> },

    /// The reference table exists but cannot be interpreted.
    #[error("Malformed reference table {}: {reason}", .path.display())]
    TableFormat { path: PathBuf, reason: String },

    /// No usable row in the reference table carries this plant name.
    #[error("Plant '{name}' not found in reference table")]
    PlantNotFound { name: String },

    /// Several rows carry this plant name with different coordinates.
    #[error("Plant '{name}' is ambiguous: {count} rows with differing coordinates")]
    AmbiguousPlant { name: String, count: usize },

    /// The source image is unreadable or corrupt.
    #[error("Cannot decode image {}: {reason}", .path.display())]
    ImageDecode { path: PathBuf, reason: String },

    /// The encoder rejected the output image.
    #[error("Cannot encode image {}: {reason}", .path.display())]
    ImageEncode { path: PathBuf, reason: String },

    /// Filesystem failure while reading or writing.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image does not live under the batch input root.
    #[error("Image {} is outside the input root", .path.display())]
    OutsideInputRoot { path: PathBuf },

    /// A parameter failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GeoCropError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeoCropError::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, GeoCropError>;
