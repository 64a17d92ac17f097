//! Plant reference table parsing and lookup.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{MatchPolicy, TableColumns};
use crate::error::{GeoCropError, Result};

/// Cell values treated as an absent coordinate.
const MISSING_MARKERS: &[&str] = &["", "nan", "na", "n/a", "null", "none", "#n/a"];

/// A solar plant and its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl PlantRecord {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    fn same_location(&self, other: &PlantRecord) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

/// Rows of the reference table that carry both coordinates.
#[derive(Debug, Clone)]
pub struct PlantTable {
    origin: PathBuf,
    records: Vec<PlantRecord>,
}

enum Coordinate {
    Missing,
    Invalid,
    Value(f64),
}

fn parse_coordinate(cell: Option<&str>) -> Coordinate {
    let Some(cell) = cell else {
        return Coordinate::Missing;
    };
    let trimmed = cell.trim();
    if MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        return Coordinate::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Coordinate::Value(v),
        Ok(_) => Coordinate::Missing,
        Err(_) => Coordinate::Invalid,
    }
}

fn column_index(headers: &csv::StringRecord, wanted: &str, origin: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == wanted)
        .ok_or_else(|| GeoCropError::TableFormat {
            path: origin.to_path_buf(),
            reason: format!("missing column '{}'", wanted),
        })
}

impl PlantTable {
    /// Open and parse the table at `path`.
    pub fn load<P: AsRef<Path>>(path: P, columns: &TableColumns) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GeoCropError::ReferenceTableMissing {
                searched: vec![path.to_path_buf()],
            },
            _ => GeoCropError::io(path, e),
        })?;

        Self::from_reader(BufReader::new(file), columns, path)
    }

    /// Parse CSV data. `origin` is only used in diagnostics.
    ///
    /// Rows without a usable latitude or longitude are dropped here, before
    /// any lookup can see them.
    pub fn from_reader<R: Read>(reader: R, columns: &TableColumns, origin: &Path) -> Result<Self> {
        let format_error = |e: csv::Error| GeoCropError::TableFormat {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().map_err(format_error)?.clone();
        let name_idx = column_index(&headers, &columns.name, origin)?;
        let lat_idx = column_index(&headers, &columns.latitude, origin)?;
        let lon_idx = column_index(&headers, &columns.longitude, origin)?;

        let mut records = Vec::new();
        let mut dropped = 0usize;

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(format_error)?;
            let Some(name) = record.get(name_idx) else {
                dropped += 1;
                continue;
            };

            let lat = parse_coordinate(record.get(lat_idx));
            let lon = parse_coordinate(record.get(lon_idx));

            match (lat, lon) {
                (Coordinate::Value(latitude), Coordinate::Value(longitude)) => {
                    records.push(PlantRecord::new(name, latitude, longitude));
                }
                (Coordinate::Invalid, _) | (_, Coordinate::Invalid) => {
                    warn!(
                        "{}: row {} ('{}') has a non-numeric coordinate, skipping",
                        origin.display(),
                        row + 2,
                        name
                    );
                    dropped += 1;
                }
                _ => dropped += 1,
            }
        }

        debug!(
            "Loaded {} plant records from {} ({} rows without coordinates)",
            records.len(),
            origin.display(),
            dropped
        );

        Ok(Self {
            origin: origin.to_path_buf(),
            records,
        })
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn records(&self) -> &[PlantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records whose name is exactly `name`, in file order.
    ///
    /// No case folding or whitespace trimming is applied.
    pub fn matches(&self, name: &str) -> Vec<&PlantRecord> {
        self.records.iter().filter(|r| r.name == name).collect()
    }

    /// Resolve `name` to a single record according to `policy`.
    pub fn locate(&self, name: &str, policy: MatchPolicy) -> Result<&PlantRecord> {
        let matches = self.matches(name);

        let (first, last) = match (matches.first(), matches.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(GeoCropError::PlantNotFound {
                    name: name.to_string(),
                })
            }
        };

        if matches.iter().all(|r| r.same_location(first)) {
            return Ok(first);
        }

        match policy {
            MatchPolicy::First => Ok(first),
            MatchPolicy::Last => Ok(last),
            MatchPolicy::RejectConflicting => Err(GeoCropError::AmbiguousPlant {
                name: name.to_string(),
                count: matches.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const TABLE: &str = "\
STT,TEN_NM,VIDO,KINHDO,CONGSUAT
1,MT Solarpark 1,11.5,108.9,50
2,Trung Nam,11.6,108.8,204
3,No Coords,,,
4,Half Coords,12.0,,
5,mt solarpark 1,10.0,100.0,10
6,Bad Lat,abc,105.0,1
7,NaN Row,NaN,105.0,1
";

    fn table() -> PlantTable {
        PlantTable::from_reader(
            TABLE.as_bytes(),
            &TableColumns::default(),
            Path::new("plants.csv"),
        )
        .unwrap()
    }

    #[test]
    fn test_rows_without_coordinates_dropped() {
        let table = table();
        let names: Vec<&str> = table.records().iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["MT Solarpark 1", "Trung Nam", "mt solarpark 1"]);
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_locate_exact_match() {
        let table = table();
        let record = table.locate("MT Solarpark 1", MatchPolicy::default()).unwrap();

        assert_eq!(record.latitude, 11.5);
        assert_eq!(record.longitude, 108.9);
    }

    #[test]
    fn test_locate_is_case_and_whitespace_sensitive() {
        let table = table();

        let lower = table.locate("mt solarpark 1", MatchPolicy::default()).unwrap();
        assert_eq!(lower.latitude, 10.0);

        assert!(matches!(
            table.locate("MT SOLARPARK 1", MatchPolicy::default()),
            Err(GeoCropError::PlantNotFound { .. })
        ));
        assert!(matches!(
            table.locate(" MT Solarpark 1", MatchPolicy::default()),
            Err(GeoCropError::PlantNotFound { .. })
        ));
    }

    #[test]
    fn test_plant_without_coordinates_not_found() {
        let table = table();
        let err = table.locate("No Coords", MatchPolicy::default()).unwrap_err();
        assert!(matches!(err, GeoCropError::PlantNotFound { name } if name == "No Coords"));
    }

    #[test]
    fn test_duplicate_rows_same_location_are_not_ambiguous() {
        let data = "TEN_NM,VIDO,KINHDO\nA,10.0,100.0\nA,10.0,100.0\n";
        let table =
            PlantTable::from_reader(data.as_bytes(), &TableColumns::default(), Path::new("t"))
                .unwrap();

        assert_eq!(table.matches("A").len(), 2);
        let record = table.locate("A", MatchPolicy::RejectConflicting).unwrap();
        assert_eq!(record.longitude, 100.0);
    }

    #[test]
    fn test_conflicting_duplicates_follow_policy() {
        let data = "TEN_NM,VIDO,KINHDO\nA,10.0,100.0\nB,1.0,1.0\nA,12.0,102.0\n";
        let table =
            PlantTable::from_reader(data.as_bytes(), &TableColumns::default(), Path::new("t"))
                .unwrap();

        assert_eq!(table.locate("A", MatchPolicy::First).unwrap().latitude, 10.0);
        assert_eq!(table.locate("A", MatchPolicy::Last).unwrap().latitude, 12.0);
        assert!(matches!(
            table.locate("A", MatchPolicy::RejectConflicting),
            Err(GeoCropError::AmbiguousPlant { count: 2, .. })
        ));
    }

    #[test]
    fn test_custom_columns_and_bom() {
        let data = "\u{feff}plant,lat,lon\nX,1.5,90.5\n";
        let columns = TableColumns {
            name: "plant".to_string(),
            latitude: "lat".to_string(),
            longitude: "lon".to_string(),
        };
        let table = PlantTable::from_reader(data.as_bytes(), &columns, Path::new("t")).unwrap();

        assert_eq!(
            table.locate("X", MatchPolicy::default()).unwrap(),
            &PlantRecord::new("X", 1.5, 90.5)
        );
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let data = "TEN_NM,VIDO\nA,10.0\n";
        let err =
            PlantTable::from_reader(data.as_bytes(), &TableColumns::default(), Path::new("t"))
                .unwrap_err();

        match err {
            GeoCropError::TableFormat { reason, .. } => assert!(reason.contains("KINHDO")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thongtintinh_farm.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();

        let table = PlantTable::load(&path, &TableColumns::default()).unwrap();
        assert_eq!(table.origin(), path.as_path());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.csv");

        let err = PlantTable::load(&path, &TableColumns::default()).unwrap_err();
        assert!(matches!(
            err,
            GeoCropError::ReferenceTableMissing { searched } if searched == vec![path]
        ));
    }
}
