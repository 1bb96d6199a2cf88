/// Survey log ingestion
///
/// Reads the CSV exports of the signal logger. Each file is its own source.
/// Cells are taken as text and coerced here, so a malformed number becomes a
/// missing value instead of failing the row. A file that cannot be read at
/// all is skipped and reported; the rest of the directory still loads.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{SurveyError, SurveyResult};
use crate::measurement::{MeasurementRecord, SourceId};

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Latitude", default)]
    latitude: Option<String>,
    #[serde(rename = "Longitude", default)]
    longitude: Option<String>,
    #[serde(rename = "SignalStrength_dBm", default)]
    signal_strength_dbm: Option<String>,
    #[serde(rename = "NetworkType", default)]
    network_type: Option<String>,
    #[serde(rename = "Band", default)]
    band: Option<String>,
    #[serde(rename = "Time", default)]
    time: Option<String>,
}

fn non_empty(cell: Option<String>) -> Option<String> {
    cell.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn coerce_f64(cell: Option<&str>) -> Option<f64> {
    cell.and_then(|s| s.trim().parse::<f64>().ok())
}

/// Integer text, or a float with no fractional part ("3.0" from spreadsheet exports).
pub fn coerce_band(cell: Option<&str>) -> Option<i64> {
    let s = cell?.trim();
    if let Ok(band) = s.parse::<i64>() {
        return Some(band);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

impl RawRow {
    fn into_record(self, source_id: &SourceId) -> MeasurementRecord {
        MeasurementRecord {
            latitude: coerce_f64(self.latitude.as_deref()),
            longitude: coerce_f64(self.longitude.as_deref()),
            signal_strength_dbm: coerce_f64(self.signal_strength_dbm.as_deref()),
            network_type: non_empty(self.network_type),
            band: coerce_band(self.band.as_deref()),
            time: non_empty(self.time),
            source_id: source_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoad {
    pub source_id: SourceId,
    pub rows: usize,
    /// Rows the CSV reader could not decode at all (e.g. invalid UTF-8).
    pub malformed_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSource {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct SurveyLog {
    pub records: Vec<MeasurementRecord>,
    pub sources: Vec<SourceLoad>,
    pub failed_sources: Vec<FailedSource>,
}

impl SurveyLog {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse one CSV stream into records tagged with `source_id`.
pub fn load_reader<R: Read>(source_id: SourceId, reader: R) -> Result<(Vec<MeasurementRecord>, SourceLoad), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    rdr.headers()?;

    let mut records = Vec::new();
    let mut malformed_rows = 0;
    for result in rdr.deserialize::<RawRow>() {
        match result {
            Ok(row) => records.push(row.into_record(&source_id)),
            Err(e) => {
                debug!(source = %source_id, error = %e, "skipping malformed row");
                malformed_rows += 1;
            }
        }
    }

    let load = SourceLoad {
        source_id,
        rows: records.len(),
        malformed_rows,
    };
    Ok((records, load))
}

pub fn load_file(path: &Path) -> SurveyResult<(Vec<MeasurementRecord>, SourceLoad)> {
    let file = File::open(path).map_err(|source| SurveyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source_id = SourceId::new(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown"),
    );

    load_reader(source_id, BufReader::new(file)).map_err(|source| SurveyError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Load every `*.csv` directly inside `dir`, in file-name order.
pub fn load_directory(dir: &Path) -> SurveyResult<SurveyLog> {
    if !dir.is_dir() {
        return Err(SurveyError::DataDirNotFound(dir.to_path_buf()));
    }

    let mut log = SurveyLog::default();
    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_csv(entry.path()) {
            continue;
        }

        match load_file(entry.path()) {
            Ok((records, load)) => {
                debug!(source = %load.source_id, rows = load.rows, "loaded source");
                log.records.extend(records);
                log.sources.push(load);
            }
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "skipping unreadable source");
                log.failed_sources.push(FailedSource {
                    path: entry.path().to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        sources = log.sources.len(),
        failed = log.failed_sources.len(),
        records = log.records.len(),
        "loaded survey logs"
    );
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "Time,Latitude,Longitude,SignalStrength_dBm,NetworkType,Band\n";

    #[test]
    fn test_coerces_cells_leniently() {
        let data = format!(
            "{}{}{}{}",
            HEADER,
            "2024-03-01 08:00:00,10.5,20.25,-85,LTE,3\n",
            "2024-03-01 08:00:01,abc, 20.3 ,N/A,,3.0\n",
            ",,,2147483647,NR,x\n",
        );
        let (records, load) = load_reader(SourceId::new("drive.csv"), data.as_bytes()).unwrap();

        assert_eq!(load.rows, 3);
        assert_eq!(load.malformed_rows, 0);

        assert_eq!(records[0].latitude, Some(10.5));
        assert_eq!(records[0].signal_strength_dbm, Some(-85.0));
        assert_eq!(records[0].network_type.as_deref(), Some("LTE"));
        assert_eq!(records[0].band, Some(3));
        assert_eq!(records[0].source_id.as_str(), "drive.csv");

        assert_eq!(records[1].latitude, None);
        assert_eq!(records[1].longitude, Some(20.3));
        assert_eq!(records[1].signal_strength_dbm, None);
        assert_eq!(records[1].network_type, None);
        assert_eq!(records[1].band, Some(3));

        assert_eq!(records[2].time, None);
        assert_eq!(records[2].signal_strength_dbm, Some(2_147_483_647.0));
        assert_eq!(records[2].band, None);
    }

    #[test]
    fn test_missing_columns_and_short_rows() {
        let data = "Extra,Latitude,Longitude\nfoo,1.5,2.5\nbar,3.5\n";
        let (records, load) = load_reader(SourceId::new("short.csv"), data.as_bytes()).unwrap();
        assert_eq!(load.rows, 2);
        assert_eq!(records[0].latitude, Some(1.5));
        assert_eq!(records[0].signal_strength_dbm, None);
        assert_eq!(records[1].latitude, Some(3.5));
        assert_eq!(records[1].longitude, None);
    }

    #[test]
    fn test_band_coercion() {
        assert_eq!(coerce_band(Some("-1")), Some(-1));
        assert_eq!(coerce_band(Some(" 40 ")), Some(40));
        assert_eq!(coerce_band(Some("8.0")), Some(8));
        assert_eq!(coerce_band(Some("8.5")), None);
        assert_eq!(coerce_band(Some("NaN")), None);
        assert_eq!(coerce_band(None), None);
    }

    #[test]
    fn test_load_directory_skips_bad_files() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("b_evening.csv"),
            format!("{}2024-03-01 18:00:00,5.0,5.0,-90,LTE,1\n", HEADER),
        )
        .unwrap();
        fs::write(
            dir.path().join("a_morning.CSV"),
            format!("{}2024-03-01 08:00:00,1.0,1.0,-70,NR,3\n2024-03-01 08:00:05,1.0,1.0,-71,NR,3\n", HEADER),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a log").unwrap();
        // Invalid UTF-8 in the header line fails the whole file.
        fs::write(dir.path().join("c_broken.csv"), [0xff, 0xfe, b',', 0xff, b'\n']).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.csv"), HEADER).unwrap();

        let log = load_directory(dir.path()).unwrap();

        assert_eq!(log.records.len(), 3);
        let sources: Vec<&str> = log.sources.iter().map(|s| s.source_id.as_str()).collect();
        assert_eq!(sources, vec!["a_morning.CSV", "b_evening.csv"]);
        assert_eq!(log.failed_sources.len(), 1);
        assert!(log.failed_sources[0].path.ends_with("c_broken.csv"));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            load_directory(&missing),
            Err(SurveyError::DataDirNotFound(_))
        ));
    }
}
