//! Historical backfill: one full-year request per completed year.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Datelike;
use log::{debug, error, info, warn};

use crate::config::MIN_PACE_MS;
use crate::data::QuoteSource;
use crate::domain::{DateRange, RateSnapshot};
use crate::error::AppError;
use crate::ingest::Clock;
use crate::io::snapshot::SnapshotStore;

/// Years written by a successful backfill run, in request order.
#[derive(Debug, Clone, Default)]
pub struct BackfillSummary {
    pub years: Vec<i32>,
    pub files: Vec<PathBuf>,
}

pub struct BackfillDriver<'a, S: QuoteSource, C: Clock> {
    source: &'a S,
    store: &'a SnapshotStore,
    clock: &'a C,
    pace: Duration,
}

impl<'a, S: QuoteSource, C: Clock> BackfillDriver<'a, S, C> {
    /// `pace` below the provider floor is raised to it.
    pub fn new(source: &'a S, store: &'a SnapshotStore, clock: &'a C, pace: Duration) -> Self {
        let floor = Duration::from_millis(MIN_PACE_MS);
        if pace < floor {
            warn!("Pacing {pace:?} is below the {MIN_PACE_MS} ms minimum; using {floor:?}.");
        }
        let pace = pace.max(floor);
        Self {
            source,
            store,
            clock,
            pace,
        }
    }

    /// Backfill `[start_year, current year)`; the current year belongs to the
    /// incremental driver.
    pub fn run_through_last_complete_year(&self, start_year: i32) -> Result<BackfillSummary, AppError> {
        self.run(start_year, self.clock.today().year())
    }

    /// Fetch and store every year in `[start_year, end_year_exclusive)`, in
    /// ascending order, pausing between consecutive requests.
    ///
    /// Stops at the first failure. Years written before the failure stay on
    /// disk; re-running the backfill rewrites them.
    pub fn run(&self, start_year: i32, end_year_exclusive: i32) -> Result<BackfillSummary, AppError> {
        let current_year = self.clock.today().year();
        if end_year_exclusive > current_year {
            let range = DateRange::full_year(end_year_exclusive - 1)?;
            return Err(AppError::InvalidRange {
                start: range.start(),
                end: range.end(),
                reason: format!("backfill must stop before the current year ({current_year})"),
            });
        }

        let mut summary = BackfillSummary::default();
        if start_year >= end_year_exclusive {
            warn!("Nothing to backfill: start year {start_year} is not before {end_year_exclusive}.");
            return Ok(summary);
        }

        info!(
            "Starting historical FX backfill {start_year}..{end_year_exclusive} into '{}'.",
            self.store.root().display()
        );

        for year in start_year..end_year_exclusive {
            if year > start_year {
                debug!("Pausing {:?} before requesting {year}.", self.pace);
                self.clock.sleep(self.pace);
            }

            match self.backfill_year(year) {
                Ok(path) => {
                    info!("[{year}] Saved -> {}", path.display());
                    summary.years.push(year);
                    summary.files.push(path);
                }
                Err(err) => {
                    error!(
                        "Backfill aborted at {year}; {} earlier year(s) remain on disk: {:?}",
                        summary.years.len(),
                        summary.years
                    );
                    return Err(err);
                }
            }
        }

        info!("Historical backfill completed ({} year(s)).", summary.years.len());
        Ok(summary)
    }

    fn backfill_year(&self, year: i32) -> Result<PathBuf, AppError> {
        let range = DateRange::full_year(year)?;
        info!("[{year}] Downloading {range}...");
        let payload = self.source.fetch_timeframe(range)?;
        let snapshot = RateSnapshot::new(year, range, payload)?;
        self.store.write(&snapshot)
    }
}
