//! Time source abstraction
//!
//! The scheduler and the payment timeline both depend on "now". Injecting a
//! clock keeps the sweep rules testable against arbitrary dates instead of
//! the machine calendar.

use chrono::{Duration, NaiveDate, NaiveTime, Utc};

/// Injectable time source
pub trait Clock: Send + Sync {
    /// Current UTC timestamp in milliseconds
    fn now_millis(&self) -> i64;

    /// Current UTC calendar date
    fn today(&self) -> NaiveDate;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Compute how long to sleep until the next daily trigger at `run_time` UTC.
///
/// If today's trigger has already passed, waits for tomorrow's. Never
/// returns zero; a 60s floor guards against clock edge cases.
pub fn duration_until_next_run(run_time: NaiveTime) -> std::time::Duration {
    let now = Utc::now();
    let today = now.date_naive();

    let target_date = if now.time() >= run_time {
        today + Duration::days(1)
    } else {
        today
    };

    let target = target_date.and_time(run_time).and_utc();
    let duration = target.signed_duration_since(now);
    if duration.num_seconds() <= 0 {
        std::time::Duration::from_secs(60)
    } else {
        duration.to_std().unwrap_or(std::time::Duration::from_secs(60))
    }
}

/// Fixed clock for tests; date and timestamp are set by hand
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedClock {
    pub date: NaiveDate,
    pub millis: i64,
}

#[cfg(test)]
impl FixedClock {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            millis: 1_700_000_000_000,
        }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }

    fn today(&self) -> NaiveDate {
        self.date
    }
}
