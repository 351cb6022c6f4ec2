//! Snapshot files -> uniformly-typed rows.
//!
//! Each snapshot file contributes rows (one per top-level object); the column
//! set is the union of top-level fields across every file, in first-seen
//! order, and each column gets one type that fits every value seen for it.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use log::warn;
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::io::snapshot::SnapshotFile;

/// Provenance columns appended to every row.
pub const LOADED_AT_COLUMN: &str = "loaded_at_utc";
pub const SOURCE_FILE_COLUMN: &str = "source_file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Integer,
    Real,
    Text,
    /// Nested object or array, stored as JSON text.
    Json,
}

impl ColumnType {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnType::Boolean),
            Value::Number(n) if n.is_i64() => Some(ColumnType::Integer),
            Value::Number(_) => Some(ColumnType::Real),
            Value::String(_) => Some(ColumnType::Text),
            Value::Array(_) | Value::Object(_) => Some(ColumnType::Json),
        }
    }

    /// Smallest type able to hold values of both `self` and `other`.
    fn widen(self, other: Self) -> Self {
        use ColumnType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Real) | (Real, Integer) => Real,
            _ => Text,
        }
    }

    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text | ColumnType::Json => "TEXT",
        }
    }

    pub fn to_sql(self, value: &Value) -> SqlValue {
        match (self, value) {
            (_, Value::Null) => SqlValue::Null,
            (ColumnType::Boolean, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
            (ColumnType::Integer, Value::Number(n)) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Text(n.to_string()),
            },
            (ColumnType::Real, Value::Number(n)) => match n.as_f64() {
                Some(f) => SqlValue::Real(f),
                None => SqlValue::Text(n.to_string()),
            },
            (_, Value::String(s)) => SqlValue::Text(s.clone()),
            (_, other) => SqlValue::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// One output row before provenance is stamped.
#[derive(Debug, Clone)]
pub struct SourceRow {
    pub source_file: String,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct RowBatch {
    pub columns: Vec<Column>,
    pub rows: Vec<SourceRow>,
    /// Rows contributed by each file, in file order.
    pub rows_per_file: Vec<(String, usize)>,
}

impl RowBatch {
    /// SQL values for `row`, in column order (without provenance).
    pub fn values_for(&self, row: &SourceRow) -> Vec<SqlValue> {
        self.columns
            .iter()
            .map(|c| match row.fields.get(&c.name) {
                Some(v) => c.ty.to_sql(v),
                None => SqlValue::Null,
            })
            .collect()
    }
}

/// Read every file and infer the unified row structure.
pub fn collect_rows(files: &[SnapshotFile]) -> Result<RowBatch, AppError> {
    let mut batch = RowBatch::default();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen_types: Vec<Option<ColumnType>> = Vec::new();

    for file in files {
        let objects = read_objects(file)?;
        batch.rows_per_file.push((file.file_name.clone(), objects.len()));

        for fields in objects {
            // SQLite column names are ASCII case-insensitive; so is the union.
            let mut row = Map::new();
            for (name, value) in fields {
                if [LOADED_AT_COLUMN, SOURCE_FILE_COLUMN]
                    .iter()
                    .any(|reserved| name.eq_ignore_ascii_case(reserved))
                {
                    warn!("{}: field '{name}' collides with a provenance column; dropped.", file.file_name);
                    continue;
                }

                let slot = *index.entry(name.to_ascii_lowercase()).or_insert_with(|| {
                    batch.columns.push(Column {
                        name: name.clone(),
                        ty: ColumnType::Text,
                    });
                    seen_types.push(None);
                    batch.columns.len() - 1
                });
                let canonical = batch.columns[slot].name.clone();
                if row.contains_key(&canonical) {
                    warn!(
                        "{}: field '{name}' duplicates column '{canonical}' (names are case-insensitive); dropped.",
                        file.file_name
                    );
                    continue;
                }

                if let Some(ty) = ColumnType::of(&value) {
                    seen_types[slot] = Some(match seen_types[slot] {
                        Some(prev) => prev.widen(ty),
                        None => ty,
                    });
                }
                row.insert(canonical, value);
            }

            batch.rows.push(SourceRow {
                source_file: file.file_name.clone(),
                fields: row,
            });
        }
    }

    // All-null columns stay TEXT.
    for (column, ty) in batch.columns.iter_mut().zip(seen_types) {
        column.ty = ty.unwrap_or(ColumnType::Text);
    }

    Ok(batch)
}

fn read_objects(file: &SnapshotFile) -> Result<Vec<Map<String, Value>>, AppError> {
    let handle = File::open(&file.path)
        .map_err(|e| AppError::io(format!("Failed to open snapshot '{}'", file.path.display()), e))?;
    let value: Value = serde_json::from_reader(BufReader::new(handle))
        .map_err(|e| AppError::json(format!("Invalid snapshot JSON '{}'", file.path.display()), e))?;

    match value {
        Value::Object(obj) => Ok(vec![obj]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(obj) => Ok(obj),
                _ => Err(AppError::MalformedSnapshot {
                    path: file.path.clone(),
                    reason: format!("array element {i} is not an object"),
                }),
            })
            .collect(),
        _ => Err(AppError::MalformedSnapshot {
            path: file.path.clone(),
            reason: "top-level value is neither an object nor an array of objects".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::io::snapshot::file_name_for;

    fn put(dir: &Path, year: i32, body: &str) -> SnapshotFile {
        let file_name = file_name_for(year);
        let path = dir.join(&file_name);
        fs::write(&path, body).unwrap();
        SnapshotFile { year, path, file_name }
    }

    #[test]
    fn union_of_fields_with_widened_types() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            put(dir.path(), 2000, r#"{"success": true, "source": "USD", "n": 1, "quotes": {"2000-01-01": {}}}"#),
            put(dir.path(), 2001, r#"{"success": true, "n": 1.5, "extra": null, "historical": "yes"}"#),
        ];

        let batch = collect_rows(&files).unwrap();
        let cols: Vec<_> = batch.columns.iter().map(|c| (c.name.as_str(), c.ty)).collect();
        assert_eq!(
            cols,
            vec![
                ("n", ColumnType::Real),
                ("quotes", ColumnType::Json),
                ("source", ColumnType::Text),
                ("success", ColumnType::Boolean),
                ("extra", ColumnType::Text),
                ("historical", ColumnType::Text),
            ]
        );
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(
            batch.rows_per_file,
            vec![
                ("usd_other_fx_rates_2000.json".to_string(), 1),
                ("usd_other_fx_rates_2001.json".to_string(), 1)
            ]
        );

        // Missing fields become NULL; nested values become JSON text.
        let values = batch.values_for(&batch.rows[1]);
        assert_eq!(values[1], SqlValue::Null);
        let values = batch.values_for(&batch.rows[0]);
        assert_eq!(values[0], SqlValue::Real(1.0));
        assert_eq!(values[1], SqlValue::Text(r#"{"2000-01-01":{}}"#.to_string()));
        assert_eq!(values[3], SqlValue::Integer(1));
    }

    #[test]
    fn conflicting_types_fall_back_to_text() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            put(dir.path(), 2000, r#"{"terms": 5}"#),
            put(dir.path(), 2001, r#"{"terms": "https://example.com/terms"}"#),
        ];
        let batch = collect_rows(&files).unwrap();
        assert_eq!(batch.columns[0].ty, ColumnType::Text);
        assert_eq!(batch.values_for(&batch.rows[0])[0], SqlValue::Text("5".to_string()));
    }

    #[test]
    fn arrays_of_objects_yield_one_row_each() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![put(dir.path(), 2000, r#"[{"a": 1}, {"a": 2}, {"b": true}]"#)];
        let batch = collect_rows(&files).unwrap();
        assert_eq!(batch.rows.len(), 3);
        assert_eq!(batch.rows_per_file[0].1, 3);
    }

    #[test]
    fn scalars_and_mixed_arrays_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_rows(&[put(dir.path(), 2000, "42")]).unwrap_err();
        assert!(matches!(err, AppError::MalformedSnapshot { .. }));
        let err = collect_rows(&[put(dir.path(), 2001, r#"[{"a": 1}, 2]"#)]).unwrap_err();
        assert!(matches!(err, AppError::MalformedSnapshot { .. }));
        let err = collect_rows(&[put(dir.path(), 2002, "{broken")]).unwrap_err();
        assert!(matches!(err, AppError::Json { .. }));
    }

    #[test]
    fn provenance_names_in_payload_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![put(dir.path(), 2000, r#"{"source_file": "x", "rate": 1.0}"#)];
        let batch = collect_rows(&files).unwrap();
        let names: Vec<_> = batch.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["rate"]);
    }

    #[test]
    fn field_names_differing_only_in_case_share_a_column() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            put(dir.path(), 2000, r#"{"success": true, "rate": 1.0}"#),
            put(
                dir.path(),
                2001,
                r#"{"Loaded_At_UTC": "x", "SOURCE_FILE": "y", "Success": false, "success": true, "RATE": 2}"#,
            ),
        ];

        let batch = collect_rows(&files).unwrap();
        let cols: Vec<_> = batch.columns.iter().map(|c| (c.name.as_str(), c.ty)).collect();
        assert_eq!(cols, vec![("rate", ColumnType::Real), ("success", ColumnType::Boolean)]);

        // First spelling in key order wins; the later duplicate is dropped.
        let values = batch.values_for(&batch.rows[1]);
        assert_eq!(values, vec![SqlValue::Real(2.0), SqlValue::Integer(0)]);
        assert_eq!(batch.rows[1].fields.len(), 2);
    }
}
