//! Shared domain types.
//!
//! These are kept deliberately small: the provider payload itself is passed
//! through as an opaque JSON object so that whatever fields the provider adds
//! end up in the snapshot files (and later in the analytical table) untouched.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Date format used for range parameters and quote keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidRange {
                start,
                end,
                reason: "start is after end".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// `[year-01-01, year-12-31]`.
    pub fn full_year(year: i32) -> Result<Self, AppError> {
        let (start, end) = year_bounds(year)?;
        Self::new(start, end)
    }

    /// `[day.year-01-01, day]`.
    pub fn year_to_date(day: NaiveDate) -> Result<Self, AppError> {
        let (start, _) = year_bounds(day.year())?;
        Self::new(start, day)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Both ends fall in `year`.
    pub fn within_year(&self, year: i32) -> bool {
        self.start.year() == year && self.end.year() == year
    }

    pub fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::Config(format!("Year {year} is out of the supported calendar range."))),
    }
}

/// One calendar year of provider quotes, as fetched and as stored on disk.
///
/// Snapshots are identified by `year` alone: writing a snapshot for a year
/// replaces whatever was stored for that year before (last write wins).
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub year: i32,
    /// Range that was requested from the provider.
    ///
    /// `None` when a stored file carries no `start_date`/`end_date` fields.
    pub source_range: Option<DateRange>,
    /// Provider response, passed through as-is (contains `quotes`).
    pub payload: Map<String, Value>,
}

impl RateSnapshot {
    pub fn new(year: i32, source_range: DateRange, payload: Map<String, Value>) -> Result<Self, AppError> {
        if !source_range.within_year(year) {
            return Err(AppError::InvalidRange {
                start: source_range.start(),
                end: source_range.end(),
                reason: format!("snapshot for {year} must not request dates outside that year"),
            });
        }
        Ok(Self {
            year,
            source_range: Some(source_range),
            payload,
        })
    }

    /// Rebuild a snapshot from a stored payload, recovering the requested
    /// range from the provider's echoed `start_date`/`end_date`.
    pub fn from_stored(year: i32, payload: Map<String, Value>) -> Self {
        let source_range = payload_range(&payload).filter(|r| r.within_year(year));
        Self {
            year,
            source_range,
            payload,
        }
    }

    /// The `quotes` object (date -> pair -> rate), if present.
    pub fn quotes(&self) -> Option<&Map<String, Value>> {
        quotes_of(&self.payload)
    }
}

/// The `quotes` object of a provider payload, if it is present and an object.
pub fn quotes_of(payload: &Map<String, Value>) -> Option<&Map<String, Value>> {
    payload.get("quotes").and_then(Value::as_object)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn payload_range(payload: &Map<String, Value>) -> Option<DateRange> {
    let start = payload.get("start_date").and_then(Value::as_str).and_then(parse_date)?;
    let end = payload.get("end_date").and_then(Value::as_str).and_then(parse_date)?;
    DateRange::new(start, end).ok()
}
