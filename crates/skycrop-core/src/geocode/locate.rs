//! Finding the reference table on disk.
//!
//! The table is either given by path, or searched for by file name in a short
//! list of directories. Each directory is walked to a bounded depth; there is
//! no whole-filesystem scan.

use std::path::PathBuf;

use log::debug;
use walkdir::WalkDir;

use crate::error::{GeoCropError, Result};

/// File name of the plant reference table shipped with the imagery archive.
pub const DEFAULT_TABLE_NAME: &str = "thongtintinh_farm.csv";

/// Default depth for [`TableSource::Search`].
pub const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Where the plant reference table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// Explicit path to the table.
    Path(PathBuf),
    /// Look for `file_name` under each of `dirs`, in order.
    Search {
        file_name: String,
        dirs: Vec<PathBuf>,
        max_depth: usize,
    },
}

impl TableSource {
    /// Search `dirs` for the default table name at the default depth.
    pub fn search_in(dirs: Vec<PathBuf>) -> Self {
        TableSource::Search {
            file_name: DEFAULT_TABLE_NAME.to_string(),
            dirs,
            max_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Resolve to an existing file.
    ///
    /// For a search, the first directory in list order that contains the file
    /// wins; within one directory entries are visited in file-name order, so
    /// the result is deterministic.
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            TableSource::Path(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(GeoCropError::ReferenceTableMissing {
                        searched: vec![path.clone()],
                    })
                }
            }
            TableSource::Search {
                file_name,
                dirs,
                max_depth,
            } => {
                for dir in dirs {
                    if let Some(found) = search_dir(dir, file_name, *max_depth) {
                        debug!("Found reference table at {}", found.display());
                        return Ok(found);
                    }
                }
                Err(GeoCropError::ReferenceTableMissing {
                    searched: dirs.clone(),
                })
            }
        }
    }
}

fn search_dir(dir: &std::path::Path, file_name: &str, max_depth: usize) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
}
