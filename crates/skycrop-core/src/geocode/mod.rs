//! Plant geocoding: resolve a plant name to latitude and longitude.
//!
//! The reference table is a CSV file with at least a name, a latitude and a
//! longitude column (see [`TableColumns`](crate::config::TableColumns)).
//! Lookup is an exact string comparison on the name column.

mod locate;
mod table;

pub use locate::{TableSource, DEFAULT_SEARCH_DEPTH, DEFAULT_TABLE_NAME};
pub use table::{PlantRecord, PlantTable};
