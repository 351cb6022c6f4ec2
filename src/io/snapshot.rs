//! Yearly JSON snapshot files.
//!
//! A snapshot for year `Y` lives at `<root>/usd_other_fx_rates_Y.json`; the
//! file name is its only identity. Writing a year replaces the previous file
//! for that year wholesale (last write wins), so the directory never holds
//! more than one file per year.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::RateSnapshot;
use crate::error::AppError;

const FILE_PREFIX: &str = "usd_other_fx_rates_";
const FILE_SUFFIX: &str = ".json";

/// A snapshot file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub year: i32,
    pub path: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, year: i32) -> PathBuf {
        self.root.join(file_name_for(year))
    }

    /// Persist `snapshot`, replacing any existing file for its year.
    pub fn write(&self, snapshot: &RateSnapshot) -> Result<PathBuf, AppError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            AppError::io(format!("Failed to create snapshot dir '{}'", self.root.display()), e)
        })?;

        let path = self.path_for(snapshot.year);
        let tmp = path.with_extension("json.tmp");

        let written = write_file(&tmp, snapshot).and_then(|()| {
            fs::rename(&tmp, &path).map_err(|e| {
                AppError::io(format!("Failed to move snapshot into place at '{}'", path.display()), e)
            })
        });
        if let Err(err) = written {
            // Drop the partial temp file; the previous snapshot stays as it was.
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }

        Ok(path)
    }

    pub fn read(&self, year: i32) -> Result<RateSnapshot, AppError> {
        let path = self.path_for(year);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::SnapshotNotFound { year, path });
            }
            Err(e) => return Err(AppError::io(format!("Failed to open snapshot '{}'", path.display()), e)),
        };

        let value: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AppError::json(format!("Invalid snapshot JSON '{}'", path.display()), e))?;
        let Value::Object(payload) = value else {
            return Err(AppError::MalformedSnapshot {
                path,
                reason: "top-level value is not an object".to_string(),
            });
        };

        Ok(RateSnapshot::from_stored(year, payload))
    }

    /// Years with a snapshot on disk, in no particular order.
    pub fn list_years(&self) -> Result<Vec<i32>, AppError> {
        Ok(self.scan()?.into_iter().map(|f| f.year).collect())
    }

    /// Snapshot files on disk, sorted by year.
    pub fn snapshot_files(&self) -> Result<Vec<SnapshotFile>, AppError> {
        let mut files = self.scan()?;
        files.sort_by_key(|f| f.year);
        Ok(files)
    }

    fn scan(&self) -> Result<Vec<SnapshotFile>, AppError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::io(
                    format!("Failed to list snapshot dir '{}'", self.root.display()),
                    e,
                ));
            }
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                AppError::io(format!("Failed to list snapshot dir '{}'", self.root.display()), e)
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if let Some(year) = parse_file_name(&file_name) {
                out.push(SnapshotFile { year, path, file_name });
            }
        }
        Ok(out)
    }
}

pub fn file_name_for(year: i32) -> String {
    format!("{FILE_PREFIX}{year}{FILE_SUFFIX}")
}

/// Year encoded in a snapshot file name, or `None` for any other file.
pub fn parse_file_name(name: &str) -> Option<i32> {
    let digits = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn write_file(tmp: &Path, snapshot: &RateSnapshot) -> Result<(), AppError> {
    let file = File::create(tmp)
        .map_err(|e| AppError::io(format!("Failed to create snapshot '{}'", tmp.display()), e))?;
    let mut writer = BufWriter::new(file);
    write_pretty(&mut writer, &snapshot.payload)
        .map_err(|e| AppError::json(format!("Failed to write snapshot for {}", snapshot.year), e))?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush snapshot '{}'", tmp.display()), e))
}

// Four-space indentation, same layout as the files the pipeline has always produced.
fn write_pretty<W: Write>(writer: W, payload: &Map<String, Value>) -> Result<(), serde_json::Error> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    payload.serialize(&mut ser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DateRange;
    use serde_json::json;

    fn snapshot(year: i32, rate: f64) -> RateSnapshot {
        let payload = json!({
            "success": true,
            "start_date": format!("{year}-01-01"),
            "end_date": format!("{year}-12-31"),
            "quotes": {format!("{year}-01-01"): {"USDEUR": rate}}
        });
        RateSnapshot::new(
            year,
            DateRange::full_year(year).unwrap(),
            payload.as_object().unwrap().clone(),
        )
        .unwrap()
    }

    #[test]
    fn file_names_round_trip_and_reject_strangers() {
        assert_eq!(file_name_for(2024), "usd_other_fx_rates_2024.json");
        assert_eq!(parse_file_name("usd_other_fx_rates_1999.json"), Some(1999));
        assert_eq!(parse_file_name("usd_other_fx_rates_1999.json.tmp"), None);
        assert_eq!(parse_file_name("usd_other_fx_rates_99.json"), None);
        assert_eq!(parse_file_name("usd_other_fx_rates_abcd.json"), None);
        assert_eq!(parse_file_name("eur_other_fx_rates_2024.json"), None);
    }

    #[test]
    fn write_creates_root_and_read_returns_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("jsons").join("fx_jsons"));

        let path = store.write(&snapshot(2020, 0.91)).unwrap();
        assert!(path.ends_with("usd_other_fx_rates_2020.json"));

        let back = store.read(2020).unwrap();
        assert_eq!(back.year, 2020);
        assert_eq!(back.source_range, Some(DateRange::full_year(2020).unwrap()));
        assert_eq!(back.payload, snapshot(2020, 0.91).payload);
    }

    #[test]
    fn files_use_four_space_indentation() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store.write(&snapshot(2021, 0.8)).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("\n    \"quotes\": {"), "{text}");
    }

    #[test]
    fn rewriting_a_year_replaces_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.write(&snapshot(2022, 0.9)).unwrap();
        store.write(&snapshot(2022, 0.95)).unwrap();

        assert_eq!(store.list_years().unwrap(), vec![2022]);
        let rate = store.read(2022).unwrap().quotes().unwrap()["2022-01-01"]["USDEUR"].as_f64();
        assert_eq!(rate, Some(0.95));
        // No leftover temp file.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        // A directory squatting on the target name makes the final rename fail.
        let target = store.path_for(2023);
        fs::create_dir_all(target.join("occupied")).unwrap();

        let err = store.write(&snapshot(2023, 0.9)).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
        assert!(!target.with_extension("json.tmp").exists());
        assert!(target.is_dir());
    }

    #[test]
    fn reading_a_missing_year_reports_snapshot_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let err = store.read(2001).unwrap_err();
        assert!(matches!(err, AppError::SnapshotNotFound { year: 2001, .. }));
    }

    #[test]
    fn listing_ignores_unrelated_files_and_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("absent"));
        assert!(store.list_years().unwrap().is_empty());

        let store = SnapshotStore::new(dir.path());
        store.write(&snapshot(2005, 1.0)).unwrap();
        store.write(&snapshot(2001, 1.0)).unwrap();
        fs::write(dir.path().join("notes.json"), "{}").unwrap();

        let mut years = store.list_years().unwrap();
        years.sort();
        assert_eq!(years, vec![2001, 2005]);

        let files = store.snapshot_files().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["usd_other_fx_rates_2001.json", "usd_other_fx_rates_2005.json"]);
    }

    #[test]
    fn non_object_snapshot_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        fs::write(store.path_for(2010), "[1, 2, 3]").unwrap();
        assert!(matches!(store.read(2010).unwrap_err(), AppError::MalformedSnapshot { .. }));
    }
}
