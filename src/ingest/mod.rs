//! Fetch drivers.
//!
//! - `backfill`: complete historical years, one paced request per year
//! - `incremental`: the current year through yesterday, followed by QC
//!
//! Both drivers are single-threaded and talk to the outside world only
//! through `QuoteSource`, `SnapshotStore` and `Clock`.

pub mod backfill;
pub mod incremental;

use std::time::Duration;

use chrono::{Local, NaiveDate};

pub use backfill::{BackfillDriver, BackfillSummary};
pub use incremental::{IncrementalDriver, IncrementalOutcome};

/// Source of "today" and of pauses between provider calls.
pub trait Clock {
    fn today(&self) -> NaiveDate;
    fn sleep(&self, duration: Duration);
}

/// Wall clock in the local timezone (the cron host's calendar day).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use serde_json::{Map, Value, json};

    use super::*;
    use crate::data::QuoteSource;
    use crate::domain::DateRange;
    use crate::error::AppError;

    /// Fixed "today"; records requested sleeps instead of sleeping.
    pub struct FixedClock {
        pub today: NaiveDate,
        pub sleeps: RefCell<Vec<Duration>>,
    }

    impl FixedClock {
        pub fn on(today: NaiveDate) -> Self {
            Self {
                today,
                sleeps: RefCell::new(Vec::new()),
            }
        }
    }

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.today
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }

    /// Answers every request with one quote per calendar day of the range.
    #[derive(Default)]
    pub struct DailySource {
        pub calls: RefCell<Vec<DateRange>>,
        pub fail_years: HashSet<i32>,
    }

    impl DailySource {
        pub fn failing_on(years: &[i32]) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_years: years.iter().copied().collect(),
            }
        }
    }

    impl QuoteSource for DailySource {
        fn fetch_timeframe(&self, range: DateRange) -> Result<Map<String, Value>, AppError> {
            self.calls.borrow_mut().push(range);
            if self.fail_years.contains(&chrono::Datelike::year(&range.start())) {
                return Err(AppError::remote("timeframe", range, "status 500 Internal Server Error"));
            }
            Ok(daily_payload(range))
        }
    }

    pub fn daily_payload(range: DateRange) -> Map<String, Value> {
        let mut quotes = Map::new();
        let mut day = range.start();
        while day <= range.end() {
            quotes.insert(day.to_string(), json!({"USDEUR": 0.9, "USDGBP": 0.8}));
            day = day.succ_opt().expect("date in range");
        }
        let mut payload = Map::new();
        payload.insert("success".into(), json!(true));
        payload.insert("timeframe".into(), json!(true));
        payload.insert("start_date".into(), json!(range.start_param()));
        payload.insert("end_date".into(), json!(range.end_param()));
        payload.insert("source".into(), json!("USD"));
        payload.insert("quotes".into(), Value::Object(quotes));
        payload
    }
}
