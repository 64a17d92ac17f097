//! Skycrop CLI - batch crop of a sky image archive around one plant.
//!
//! # Usage
//!
//! ```text
//! skycrop --input /data/sky --output /data/processed \
//!         --plant "MT Solarpark 1" --start 20250101 --end 20250314 \
//!         --search-dir /data/meta
//! ```
//!
//! Per-image failures are logged and listed at the end; they do not change
//! the exit status. Only setup errors (arguments, parameters) do.

mod args;

use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use skycrop_core::{BatchRunner, GeoCropper};

use crate::args::Cli;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format_timestamp_secs();
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let crop_config = cli.crop_config()?;
    let batch_config = cli.batch_config()?;

    info!("Input root: {}", batch_config.input_root.display());
    info!("Output root: {}", batch_config.output_root.display());
    info!(
        "Plant '{}', dates {} to {}, scale x{}",
        batch_config.plant_name,
        batch_config.start_date.format("%Y%m%d"),
        batch_config.end_date.format("%Y%m%d"),
        crop_config.scale_factor
    );

    let cropper = GeoCropper::new(crop_config)?;
    let mut runner = BatchRunner::new(cropper, batch_config)?;
    let summary = runner.run();

    println!(
        "Done: {} written, {} failed, {} dates without data",
        summary.succeeded(),
        summary.failed(),
        summary.skipped_dates.len()
    );
    for (source, err) in summary.failures() {
        println!("  FAILED {}: {}", source.display(), err);
    }

    Ok(())
}
