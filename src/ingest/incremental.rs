//! Daily catch-up: re-fetch the current year through yesterday.
//!
//! The whole year-to-date is requested on every run and the year's snapshot
//! is overwritten, so a missed day heals itself on the next run.

use std::path::PathBuf;

use chrono::{Datelike, Duration};
use log::{info, warn};

use crate::config::QcPolicy;
use crate::data::QuoteSource;
use crate::domain::{DateRange, RateSnapshot};
use crate::error::AppError;
use crate::ingest::Clock;
use crate::io::snapshot::SnapshotStore;
use crate::qc::{self, ContinuityReport, QcWarning};

#[derive(Debug, Clone)]
pub struct IncrementalOutcome {
    pub year: i32,
    pub range: DateRange,
    pub path: PathBuf,
    /// `None` when QC was skipped.
    pub report: Option<ContinuityReport>,
    pub warnings: Vec<QcWarning>,
}

pub struct IncrementalDriver<'a, S: QuoteSource, C: Clock> {
    source: &'a S,
    store: &'a SnapshotStore,
    clock: &'a C,
    run_qc: bool,
    policy: QcPolicy,
}

impl<'a, S: QuoteSource, C: Clock> IncrementalDriver<'a, S, C> {
    pub fn new(source: &'a S, store: &'a SnapshotStore, clock: &'a C) -> Self {
        Self {
            source,
            store,
            clock,
            run_qc: true,
            policy: QcPolicy::default(),
        }
    }

    pub fn with_qc(mut self, run_qc: bool, policy: QcPolicy) -> Self {
        self.run_qc = run_qc;
        self.policy = policy;
        self
    }

    pub fn run(&self) -> Result<IncrementalOutcome, AppError> {
        let yesterday = self.clock.today() - Duration::days(1);
        let year = yesterday.year();
        let range = DateRange::year_to_date(yesterday)?;

        info!("Fetching exchange rates for {range}.");
        let payload = self.source.fetch_timeframe(range)?;
        let snapshot = RateSnapshot::new(year, range, payload)?;
        let path = self.store.write(&snapshot)?;
        info!("Saved snapshot for {year} to '{}'.", path.display());

        if !self.run_qc {
            return Ok(IncrementalOutcome {
                year,
                range,
                path,
                report: None,
                warnings: Vec::new(),
            });
        }

        // Check what actually landed on disk, not the in-memory payload.
        let stored = self.store.read(year)?;
        let report = qc::check(&stored.payload);
        let warnings = report.warnings(&self.policy, Some(range));

        match (report.first_date, report.last_date) {
            (Some(first), Some(last)) => info!(
                "QC {year}: {first}..={last}, {} observation(s), max gap {} day(s).",
                report.observations, report.max_gap_days
            ),
            _ => info!("QC {year}: no dated observations."),
        }
        for w in &warnings {
            warn!("QC {year}: {w}");
        }

        Ok(IncrementalOutcome {
            year,
            range,
            path,
            report: Some(report),
            warnings,
        })
    }
}
