use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::DateRange;

/// Every failure the pipeline can surface.
///
/// Each variant maps to a process exit code (see [`AppError::exit_code`]) so
/// cron wrappers can tell a missing credential apart from a provider outage.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing {var} in environment (.env).")]
    MissingCredential { var: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid date range {start}..={end}: {reason}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    #[error("{operation} request for {range} failed: {reason}")]
    RemoteRequest {
        operation: &'static str,
        range: DateRange,
        reason: String,
    },

    #[error("No snapshot for {year} at '{}'.", .path.display())]
    SnapshotNotFound { year: i32, path: PathBuf },

    #[error("No snapshot files (usd_other_fx_rates_<year>.json) found in '{}'.", .dir.display())]
    NoSnapshotsFound { dir: PathBuf },

    #[error("Malformed snapshot '{}': {reason}", .path.display())]
    MalformedSnapshot { path: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: {source}")]
    Database {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::MissingCredential { .. }
            | AppError::Config(_)
            | AppError::InvalidRange { .. }
            | AppError::Io { .. } => 2,
            AppError::SnapshotNotFound { .. }
            | AppError::NoSnapshotsFound { .. }
            | AppError::MalformedSnapshot { .. }
            | AppError::Json { .. } => 3,
            AppError::RemoteRequest { .. } => 4,
            AppError::Database { .. } => 5,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        AppError::Json {
            context: context.into(),
            source,
        }
    }

    pub fn db(context: impl Into<String>, source: rusqlite::Error) -> Self {
        AppError::Database {
            context: context.into(),
            source,
        }
    }

    pub fn remote(operation: &'static str, range: DateRange, reason: impl Into<String>) -> Self {
        AppError::RemoteRequest {
            operation,
            range,
            reason: reason.into(),
        }
    }
}
