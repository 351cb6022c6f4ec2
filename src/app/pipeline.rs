//! Wiring from configuration to drivers.
//!
//! The CLI handlers call these; each builds the concrete client, store and
//! clock for one run so nothing outlives the invocation.

use crate::config::{PipelineConfig, ProviderConfig};
use crate::data::ExchangeRateClient;
use crate::error::AppError;
use crate::ingest::{BackfillDriver, BackfillSummary, IncrementalDriver, IncrementalOutcome, SystemClock};
use crate::io::{LoadSummary, SnapshotStore, TableLoader};
use crate::qc::{self, ContinuityReport, QcWarning};

/// Historical backfill through the last completed year.
pub fn run_backfill(config: &PipelineConfig) -> Result<BackfillSummary, AppError> {
    config.validate()?;
    let client = ExchangeRateClient::new(ProviderConfig::from_env()?)?;
    let store = SnapshotStore::new(&config.snapshot_dir);
    BackfillDriver::new(&client, &store, &SystemClock, config.pace)
        .run_through_last_complete_year(config.start_year)
}

/// Year-to-yesterday refresh plus QC.
pub fn run_daily(config: &PipelineConfig) -> Result<IncrementalOutcome, AppError> {
    config.validate()?;
    let client = ExchangeRateClient::new(ProviderConfig::from_env()?)?;
    let store = SnapshotStore::new(&config.snapshot_dir);
    IncrementalDriver::new(&client, &store, &SystemClock)
        .with_qc(config.run_qc, config.qc)
        .run()
}

/// Full-refresh table load.
pub fn run_load(config: &PipelineConfig) -> Result<LoadSummary, AppError> {
    TableLoader::new(&config.db_path).load(&config.snapshot_dir)
}

/// QC over stored snapshots (one year, or every stored year ascending).
pub fn run_qc(
    config: &PipelineConfig,
    year: Option<i32>,
) -> Result<Vec<(i32, ContinuityReport, Vec<QcWarning>)>, AppError> {
    config.validate()?;
    let store = SnapshotStore::new(&config.snapshot_dir);
    let years = match year {
        Some(y) => vec![y],
        None => {
            let mut ys = store.list_years()?;
            ys.sort();
            ys
        }
    };
    if years.is_empty() {
        return Err(AppError::NoSnapshotsFound {
            dir: config.snapshot_dir.clone(),
        });
    }

    let mut out = Vec::with_capacity(years.len());
    for y in years {
        let snapshot = store.read(y)?;
        let report = qc::check(&snapshot.payload);
        let warnings = report.warnings(&config.qc, snapshot.source_range);
        out.push((y, report, warnings));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{DateRange, RateSnapshot};

    #[test]
    fn qc_checks_stored_years_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        for year in [2011, 2009, 2010] {
            let range = DateRange::full_year(year).unwrap();
            let payload = json!({
                "start_date": range.start_param(),
                "end_date": range.end_param(),
                "quotes": {range.start_param(): {}, range.end_param(): {}}
            });
            store
                .write(&RateSnapshot::new(year, range, payload.as_object().unwrap().clone()).unwrap())
                .unwrap();
        }

        let config = PipelineConfig {
            snapshot_dir: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let results = run_qc(&config, None).unwrap();
        let years: Vec<_> = results.iter().map(|(y, _, _)| *y).collect();
        assert_eq!(years, vec![2009, 2010, 2011]);
        // Only two dates a year apart: the gap warning fires, coverage is complete.
        for (_, report, warnings) in &results {
            assert_eq!(report.max_gap_days, 364);
            assert_eq!(warnings.len(), 1);
        }
    }

    #[test]
    fn qc_on_an_empty_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            snapshot_dir: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        assert!(matches!(run_qc(&config, None), Err(AppError::NoSnapshotsFound { .. })));
        assert!(matches!(run_qc(&config, Some(2020)), Err(AppError::SnapshotNotFound { .. })));
    }
}
