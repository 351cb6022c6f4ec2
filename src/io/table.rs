//! Full-refresh load of the snapshot directory into `raw.raw_ingested_data`.
//!
//! The `raw` namespace is a SQLite database attached next to the main file
//! (`currency_rates.sqlite` -> `currency_rates.raw.sqlite`).
//!
//! A load either replaces the whole table or changes nothing: every snapshot
//! is parsed before the database is touched, and drop/create/insert run in a
//! single transaction.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use rusqlite::{Connection, params_from_iter};

use crate::error::AppError;
use crate::io::rows::{self, Column, LOADED_AT_COLUMN, RowBatch, SOURCE_FILE_COLUMN};
use crate::io::snapshot::SnapshotStore;

pub const SCHEMA_NAME: &str = "raw";
pub const TABLE_NAME: &str = "raw_ingested_data";

/// Outcome of one load run.
#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub db_path: PathBuf,
    pub files: Vec<(String, usize)>,
    pub columns: Vec<Column>,
    pub loaded_at_utc: String,
    /// `SELECT COUNT(*)` after the load committed.
    pub row_count: u64,
}

pub struct TableLoader {
    db_path: PathBuf,
}

impl TableLoader {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into() }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn load(&self, snapshot_dir: &Path) -> Result<LoadSummary, AppError> {
        self.load_at(snapshot_dir, Utc::now())
    }

    /// Load with an explicit run timestamp (shared by every row).
    pub fn load_at(&self, snapshot_dir: &Path, loaded_at: DateTime<Utc>) -> Result<LoadSummary, AppError> {
        let files = SnapshotStore::new(snapshot_dir).snapshot_files()?;
        if files.is_empty() {
            return Err(AppError::NoSnapshotsFound {
                dir: snapshot_dir.to_path_buf(),
            });
        }
        info!("{} snapshot file(s) found in '{}'.", files.len(), snapshot_dir.display());

        let batch = rows::collect_rows(&files)?;
        let loaded_at_utc = loaded_at.to_rfc3339_opts(SecondsFormat::Micros, false);
        info!("Load timestamp (UTC): {loaded_at_utc}");

        let mut conn = open_database(&self.db_path)?;
        let row_count = replace_table(&mut conn, &batch, &loaded_at_utc)?;
        info!("Number of rows ingested: {row_count}");

        Ok(LoadSummary {
            db_path: self.db_path.clone(),
            files: batch.rows_per_file,
            columns: batch.columns,
            loaded_at_utc,
            row_count,
        })
    }
}

/// Open the analytical database (creating its directory) with the `raw`
/// namespace attached.
pub fn open_database(db_path: &Path) -> Result<Connection, AppError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create database dir '{}'", parent.display()), e))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::db(format!("Failed to open database '{}'", db_path.display()), e))?;
    ensure_schema(&conn, db_path)?;
    Ok(conn)
}

/// Path of the file backing the `raw` namespace.
pub fn schema_path(db_path: &Path) -> PathBuf {
    let stem = db_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "database".to_string());
    db_path.with_file_name(format!("{stem}.{SCHEMA_NAME}.sqlite"))
}

pub fn qualified_table() -> String {
    format!("{}.{}", quote_ident(SCHEMA_NAME), quote_ident(TABLE_NAME))
}

pub fn table_row_count(conn: &Connection) -> Result<u64, AppError> {
    let sql = format!("SELECT COUNT(*) FROM {}", qualified_table());
    let count: i64 = conn
        .query_row(&sql, [], |row| row.get(0))
        .map_err(|e| AppError::db("Failed to count ingested rows", e))?;
    Ok(count.max(0) as u64)
}

fn ensure_schema(conn: &Connection, db_path: &Path) -> Result<(), AppError> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_database_list")
        .map_err(|e| AppError::db("Failed to list attached databases", e))?;
    let attached = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| AppError::db("Failed to list attached databases", e))?;
    if attached.iter().any(|name| name == SCHEMA_NAME) {
        return Ok(());
    }

    let path = schema_path(db_path);
    info!("Ensuring schema exists: {SCHEMA_NAME} ('{}')", path.display());
    conn.execute(
        &format!("ATTACH DATABASE ?1 AS {}", quote_ident(SCHEMA_NAME)),
        [path.to_string_lossy().into_owned()],
    )
    .map_err(|e| AppError::db(format!("Failed to attach schema '{SCHEMA_NAME}'"), e))?;
    Ok(())
}

fn replace_table(conn: &mut Connection, batch: &RowBatch, loaded_at_utc: &str) -> Result<u64, AppError> {
    let table = qualified_table();
    let tx = conn
        .transaction()
        .map_err(|e| AppError::db("Failed to begin load transaction", e))?;

    info!("Dropping existing table if exists: {SCHEMA_NAME}.{TABLE_NAME}");
    tx.execute(&format!("DROP TABLE IF EXISTS {table}"), [])
        .map_err(|e| AppError::db(format!("Failed to drop {table}"), e))?;

    tx.execute(&create_table_sql(&table, &batch.columns), [])
        .map_err(|e| AppError::db(format!("Failed to create {table}"), e))?;

    {
        let mut stmt = tx
            .prepare(&insert_sql(&table, &batch.columns))
            .map_err(|e| AppError::db(format!("Failed to prepare insert into {table}"), e))?;
        for row in &batch.rows {
            let mut values = batch.values_for(row);
            values.push(rusqlite::types::Value::Text(loaded_at_utc.to_string()));
            values.push(rusqlite::types::Value::Text(row.source_file.clone()));
            stmt.execute(params_from_iter(values))
                .map_err(|e| AppError::db(format!("Failed to insert row from {}", row.source_file), e))?;
        }
    }

    let row_count = table_row_count(&tx)?;
    tx.commit()
        .map_err(|e| AppError::db("Failed to commit load transaction", e))?;
    Ok(row_count)
}

fn create_table_sql(table: &str, columns: &[Column]) -> String {
    let mut defs: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_type()))
        .collect();
    defs.push(format!("{} TEXT NOT NULL", quote_ident(LOADED_AT_COLUMN)));
    defs.push(format!("{} TEXT NOT NULL", quote_ident(SOURCE_FILE_COLUMN)));
    format!("CREATE TABLE {table} ({})", defs.join(", "))
}

fn insert_sql(table: &str, columns: &[Column]) -> String {
    let names: Vec<String> = columns
        .iter()
        .map(|c| c.name.as_str())
        .chain([LOADED_AT_COLUMN, SOURCE_FILE_COLUMN])
        .map(quote_ident)
        .collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    )
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
