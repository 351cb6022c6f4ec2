//! Explicit run configuration.
//!
//! Nothing here is global: the binary loads a [`ProviderConfig`] once and
//! passes it to the client, and builds a [`PipelineConfig`] from CLI
//! arguments for the drivers.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Environment variable holding the provider access key.
pub const API_KEY_VAR: &str = "API_KEY_FX";
pub const BASE_URL_VAR: &str = "FX_BASE_URL";
pub const TIMEOUT_VAR: &str = "FX_HTTP_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate.host";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_SNAPSHOT_DIR: &str = "jsons/fx_jsons";
pub const DEFAULT_DB_PATH: &str = "databases/currency_rates.sqlite";

/// First year with euro quotes; the historical backfill starts here.
pub const DEFAULT_START_YEAR: i32 = 1999;

/// Lower bound on the pause between consecutive provider calls.
pub const MIN_PACE_MS: u64 = 500;

/// Largest gap (days) between consecutive quote dates that QC accepts silently.
pub const DEFAULT_MAX_GAP_DAYS: i64 = 4;

/// Settings needed to talk to the rate provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub access_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Load `.env` (if present) and read provider settings from the environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let access_key = lookup(API_KEY_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::MissingCredential { var: API_KEY_VAR })?;

        let base_url = lookup(BASE_URL_VAR)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| AppError::Config(format!("{TIMEOUT_VAR} must be a positive integer, got '{raw}'.")))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            access_key,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// Keep the key out of `{:?}` output (logs, panics).
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("access_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Quality-control thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QcPolicy {
    pub max_gap_days: i64,
}

impl Default for QcPolicy {
    fn default() -> Self {
        Self {
            max_gap_days: DEFAULT_MAX_GAP_DAYS,
        }
    }
}

/// Paths and knobs shared by the fetch drivers and the loader.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub snapshot_dir: PathBuf,
    pub db_path: PathBuf,
    pub start_year: i32,
    pub pace: Duration,
    pub run_qc: bool,
    pub qc: QcPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            start_year: DEFAULT_START_YEAR,
            pace: Duration::from_millis(MIN_PACE_MS),
            run_qc: true,
            qc: QcPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.pace < Duration::from_millis(MIN_PACE_MS) {
            return Err(AppError::Config(format!(
                "Pacing between provider calls must be at least {MIN_PACE_MS} ms."
            )));
        }
        if self.qc.max_gap_days < 1 {
            return Err(AppError::Config("QC gap threshold must be at least 1 day.".to_string()));
        }
        Ok(())
    }
}
