//! Batch traversal of a date/time image archive.
//!
//! The archive is laid out as `<input_root>/<YYYYMMDD>/<time folder>/<images>`.
//! For every date in an inclusive range the runner visits each time folder
//! and hands every supported image to the [`GeoCropper`]. A failure is
//! recorded against its file and the walk continues; nothing short of a bad
//! configuration stops a run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use log::{debug, info, warn};

use crate::config::{BatchConfig, TableColumns};
use crate::decode::is_supported_image;
use crate::error::{GeoCropError, Result};
use crate::geocode::{PlantTable, TableSource};
use crate::pipeline::GeoCropper;

/// Inclusive range of acquisition dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(GeoCropError::InvalidConfig(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Folder name of a date in the archive.
    pub fn folder_name(date: NaiveDate) -> String {
        date.format("%Y%m%d").to_string()
    }

    /// Number of days in the range.
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// A range always holds at least one day.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = DateIter;

    fn into_iter(self) -> Self::IntoIter {
        DateIter {
            next: Some(self.start),
            end: self.end,
        }
    }
}

/// Iterator over the days of a [`DateRange`].
#[derive(Debug, Clone)]
pub struct DateIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|d| *d <= self.end)?;
        self.next = current.checked_add_days(Days::new(1));
        Some(current)
    }
}

/// Result of processing one image.
#[derive(Debug)]
pub struct ItemOutcome {
    pub source: PathBuf,
    pub result: Result<PathBuf>,
}

/// Everything that happened during a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<ItemOutcome>,
    /// Dates in the range with no folder in the archive.
    pub skipped_dates: Vec<NaiveDate>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Failed items with their errors, in processing order.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &GeoCropError)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(e) => Some((o.source.as_path(), e)),
        })
    }

    /// Written output files, in processing order.
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(PathBuf::as_path))
    }
}

/// Sorted entries of `dir` matching `keep`. Unreadable entries are skipped.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| GeoCropError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| keep(path))
        .collect();
    entries.sort();
    Ok(entries)
}

/// The reference table, loaded on first use and kept for the run.
///
/// A failed load is not cached, so the next image tries again.
fn cached_table<'a>(
    slot: &'a mut Option<PlantTable>,
    source: &TableSource,
    columns: &TableColumns,
) -> Result<&'a PlantTable> {
    let table = match slot.take() {
        Some(table) => table,
        None => {
            let path = source.resolve()?;
            let table = PlantTable::load(&path, columns)?;
            info!(
                "Loaded {} plants from {}",
                table.len(),
                table.origin().display()
            );
            table
        }
    };
    Ok(slot.insert(table))
}

/// Walks the archive for one plant and date range.
#[derive(Debug)]
pub struct BatchRunner {
    cropper: GeoCropper,
    config: BatchConfig,
    table: Option<PlantTable>,
}

impl BatchRunner {
    pub fn new(cropper: GeoCropper, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cropper,
            config,
            table: None,
        })
    }

    fn process_image(&mut self, image_path: &Path) -> Result<PathBuf> {
        let table = cached_table(
            &mut self.table,
            &self.config.table,
            &self.cropper.config().columns,
        )?;
        self.cropper.process(
            image_path,
            &self.config.plant_name,
            table,
            &self.config.input_root,
            &self.config.output_root,
        )
    }

    fn process_time_folder(&mut self, time_dir: &Path, summary: &mut BatchSummary) {
        let images = match sorted_entries(time_dir, |p| p.is_file() && is_supported_image(p)) {
            Ok(images) => images,
            Err(e) => {
                warn!("Skipping {}: {}", time_dir.display(), e);
                return;
            }
        };

        debug!("{}: {} images", time_dir.display(), images.len());

        for image_path in images {
            let result = self.process_image(&image_path);
            if let Err(e) = &result {
                let name = image_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| image_path.display().to_string());
                warn!("Failed to process {}: {}", name, e);
            }
            summary.outcomes.push(ItemOutcome {
                source: image_path,
                result,
            });
        }
    }

    /// Process every image in the configured date range.
    pub fn run(&mut self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let range = DateRange {
            start: self.config.start_date,
            end: self.config.end_date,
        };

        for date in range {
            let date_dir = self.config.input_root.join(DateRange::folder_name(date));
            if !date_dir.is_dir() {
                summary.skipped_dates.push(date);
                continue;
            }

            info!("Processing date {}", DateRange::folder_name(date));

            let time_dirs = match sorted_entries(&date_dir, Path::is_dir) {
                Ok(dirs) => dirs,
                Err(e) => {
                    warn!("Skipping {}: {}", date_dir.display(), e);
                    continue;
                }
            };

            for time_dir in time_dirs {
                info!(
                    "  Time folder {}",
                    time_dir
                        .file_name()
                        .map(|n| n.to_string_lossy())
                        .unwrap_or_default()
                );
                self.process_time_folder(&time_dir, &mut summary);
            }
        }

        info!(
            "Batch complete: {} written, {} failed, {} of {} dates missing",
            summary.succeeded(),
            summary.failed(),
            summary.skipped_dates.len(),
            range.len()
        );

        summary
    }
}
