//! Remote rate data.
//!
//! - `QuoteSource`: the one operation the drivers need from a provider
//! - `exchangerate`: the exchangerate.host implementation

pub mod exchangerate;

use serde_json::{Map, Value};

use crate::domain::DateRange;
use crate::error::AppError;

pub use exchangerate::ExchangeRateClient;

/// A provider of daily quotes over a date range.
///
/// Each call is exactly one outbound request. Implementations neither retry
/// nor pace; callers space out consecutive calls.
pub trait QuoteSource {
    /// Fetch the provider payload for `range`. The returned object always
    /// contains a `quotes` object keyed by ISO date.
    fn fetch_timeframe(&self, range: DateRange) -> Result<Map<String, Value>, AppError>;
}
