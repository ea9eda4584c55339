//! Clock abstraction.
//!
//! The engine never reads the system time directly; tests pin "today" to
//! a fixed date.

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    /// Returns today's date in UTC.
    fn today(&self) -> NaiveDate;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A settable clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    /// Creates a clock pinned to `today`.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    /// Moves the clock to a new date.
    pub fn set(&self, today: NaiveDate) {
        *self.today.lock() = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock()
    }
}
