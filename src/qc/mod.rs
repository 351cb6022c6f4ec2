//! Continuity checks on a fetched quote series.
//!
//! QC is observability, not a gate: nothing here returns an error. An empty
//! or gappy series is described by the report and turned into warnings.

use std::fmt;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::config::QcPolicy;
use crate::domain::{DateRange, parse_date, quotes_of};

/// Coverage summary of one payload's `quotes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuityReport {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Largest day difference between consecutive observed dates (0 with < 2 dates).
    pub max_gap_days: i64,
    /// The two dates bounding `max_gap_days`.
    pub widest_gap: Option<(NaiveDate, NaiveDate)>,
    pub observations: usize,
    /// `quotes` keys that are not `YYYY-MM-DD` dates.
    pub unparsed_keys: Vec<String>,
    pub is_empty: bool,
}

impl ContinuityReport {
    fn empty(unparsed_keys: Vec<String>) -> Self {
        Self {
            first_date: None,
            last_date: None,
            max_gap_days: 0,
            widest_gap: None,
            observations: 0,
            unparsed_keys,
            is_empty: true,
        }
    }

    /// Anomalies worth a warning under `policy`, optionally measured against
    /// the range that was requested.
    pub fn warnings(&self, policy: &QcPolicy, expected: Option<DateRange>) -> Vec<QcWarning> {
        let mut out = Vec::new();

        if !self.unparsed_keys.is_empty() {
            out.push(QcWarning::UnparsedDates {
                count: self.unparsed_keys.len(),
            });
        }

        if self.is_empty {
            out.push(QcWarning::EmptySeries);
            return out;
        }

        if self.max_gap_days > policy.max_gap_days {
            if let Some((from, to)) = self.widest_gap {
                out.push(QcWarning::GapExceeded {
                    from,
                    to,
                    days: self.max_gap_days,
                    limit: policy.max_gap_days,
                });
            }
        }

        if let (Some(range), Some(first), Some(last)) = (expected, self.first_date, self.last_date) {
            let late = (first - range.start()).num_days();
            if late > policy.max_gap_days {
                out.push(QcWarning::StartsLate {
                    expected: range.start(),
                    actual: first,
                });
            }
            let early = (range.end() - last).num_days();
            if early > policy.max_gap_days {
                out.push(QcWarning::EndsEarly {
                    expected: range.end(),
                    actual: last,
                });
            }
        }

        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QcWarning {
    EmptySeries,
    GapExceeded {
        from: NaiveDate,
        to: NaiveDate,
        days: i64,
        limit: i64,
    },
    StartsLate {
        expected: NaiveDate,
        actual: NaiveDate,
    },
    EndsEarly {
        expected: NaiveDate,
        actual: NaiveDate,
    },
    UnparsedDates {
        count: usize,
    },
}

impl fmt::Display for QcWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QcWarning::EmptySeries => write!(f, "no quotes found"),
            QcWarning::GapExceeded { from, to, days, limit } => {
                write!(f, "gap of {days} days between {from} and {to} (limit {limit})")
            }
            QcWarning::StartsLate { expected, actual } => {
                write!(f, "series starts at {actual}, expected {expected}")
            }
            QcWarning::EndsEarly { expected, actual } => {
                write!(f, "series ends at {actual}, expected {expected}")
            }
            QcWarning::UnparsedDates { count } => write!(f, "{count} quote key(s) are not ISO dates"),
        }
    }
}

/// Compute the continuity report for a provider payload.
pub fn check(payload: &Map<String, Value>) -> ContinuityReport {
    let Some(quotes) = quotes_of(payload) else {
        return ContinuityReport::empty(Vec::new());
    };

    let mut dates = Vec::with_capacity(quotes.len());
    let mut unparsed_keys = Vec::new();
    for key in quotes.keys() {
        match parse_date(key) {
            Some(day) => dates.push(day),
            None => unparsed_keys.push(key.clone()),
        }
    }

    if dates.is_empty() {
        return ContinuityReport::empty(unparsed_keys);
    }

    dates.sort();

    let mut max_gap_days = 0;
    let mut widest_gap = None;
    for pair in dates.windows(2) {
        let gap = (pair[1] - pair[0]).num_days();
        if gap > max_gap_days {
            max_gap_days = gap;
            widest_gap = Some((pair[0], pair[1]));
        }
    }

    ContinuityReport {
        first_date: dates.first().copied(),
        last_date: dates.last().copied(),
        max_gap_days,
        widest_gap,
        observations: dates.len(),
        unparsed_keys,
        is_empty: false,
    }
}
