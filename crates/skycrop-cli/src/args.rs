//! Command-line arguments and their conversion into core configuration.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use skycrop_core::geocode::{DEFAULT_SEARCH_DEPTH, DEFAULT_TABLE_NAME};
use skycrop_core::{BatchConfig, GeoCropConfig, TableSource};

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|e| format!("expected YYYYMMDD: {e}"))
}

/// Crop sky images around a solar plant and upscale them.
#[derive(Parser, Debug)]
#[command(name = "skycrop", version, about)]
pub struct Cli {
    /// Archive root containing <YYYYMMDD>/<time>/<image> folders
    #[arg(long)]
    pub input: PathBuf,

    /// Output root; results go to <output>/<PLANT_NAME>/<YYYYMMDD>/<time>/
    #[arg(long)]
    pub output: PathBuf,

    /// Plant name, matched exactly against the reference table
    #[arg(long)]
    pub plant: String,

    /// First date to process (YYYYMMDD)
    #[arg(long, value_parser = parse_date)]
    pub start: NaiveDate,

    /// Last date to process, inclusive (YYYYMMDD)
    #[arg(long, value_parser = parse_date)]
    pub end: NaiveDate,

    /// Path to the plant reference table
    #[arg(long, conflicts_with = "search_dirs")]
    pub table: Option<PathBuf>,

    /// Directory to search for the reference table (repeatable)
    #[arg(long = "search-dir")]
    pub search_dirs: Vec<PathBuf>,

    /// File name to look for with --search-dir
    #[arg(long, default_value = DEFAULT_TABLE_NAME)]
    pub table_name: String,

    /// Maximum directory depth for --search-dir
    #[arg(long, default_value_t = DEFAULT_SEARCH_DEPTH)]
    pub search_depth: usize,

    /// JSON file overriding projection, radius and scale parameters
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn table_source(&self) -> Result<TableSource> {
        match (&self.table, self.search_dirs.is_empty()) {
            (Some(path), _) => Ok(TableSource::Path(path.clone())),
            (None, false) => Ok(TableSource::Search {
                file_name: self.table_name.clone(),
                dirs: self.search_dirs.clone(),
                max_depth: self.search_depth,
            }),
            (None, true) => bail!("either --table or at least one --search-dir is required"),
        }
    }

    pub fn crop_config(&self) -> Result<GeoCropConfig> {
        match &self.config {
            Some(path) => GeoCropConfig::from_file(path)
                .with_context(|| format!("loading parameters from {}", path.display())),
            None => Ok(GeoCropConfig::default()),
        }
    }

    pub fn batch_config(&self) -> Result<BatchConfig> {
        let batch = BatchConfig {
            input_root: self.input.clone(),
            output_root: self.output.clone(),
            plant_name: self.plant.clone(),
            start_date: self.start,
            end_date: self.end,
            table: self.table_source()?,
        };
        batch.validate()?;
        Ok(batch)
    }
}
