//! Occurrence enumeration and forward lookup.
//!
//! The [`Schedule`] calculator answers two questions about a recurrence:
//! which due dates fall inside a window, and what the first due date after
//! a reference date is. It prefers interpreting the canonical descriptor
//! (building one on the fly when none is persisted) and falls back to
//! stepping the anchor forward through the calendar when the descriptor
//! text cannot be interpreted. Both paths yield identical results for
//! every cadence this crate can express.

use crate::cadence::{Cadence, CadenceUnit};
use crate::descriptor::{DayAnchor, Descriptor, DescriptorError, Frequency};
use crate::error::{RecurError, RecurResult};
use crate::stepper;
use chrono::{Datelike, NaiveDate, Weekday};

/// Safety bound on enumeration steps.
///
/// Exceeding it means the cadence is degenerate or the requested window is
/// unreachably far from the anchor; the calculator fails rather than spin.
pub const STEP_LIMIT: u32 = 10_000;

/// A recurrence viewed from its anchor: the inputs the calculator needs.
///
/// `Schedule` is plain data; the enumeration functions are pure and keep
/// no state between calls, so any slice of the occurrence stream can be
/// recomputed independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// The recurrence start point. The first occurrence is the anchor
    /// itself; no occurrence ever precedes it.
    pub anchor: NaiveDate,
    /// Interval and unit.
    pub cadence: Cadence,
    /// Optional persisted descriptor text. When absent (or blank) the
    /// canonical descriptor is built from `anchor` and `cadence`.
    pub descriptor: Option<String>,
}

impl Schedule {
    /// Creates a schedule without persisted descriptor text.
    #[must_use]
    pub fn new(anchor: NaiveDate, cadence: Cadence) -> Self {
        Self {
            anchor,
            cadence,
            descriptor: None,
        }
    }

    /// Attaches persisted descriptor text.
    #[must_use]
    pub fn with_descriptor(mut self, text: impl Into<String>) -> Self {
        self.descriptor = Some(text.into());
        self
    }

    /// Enumerates due dates within `[start, end]`, inclusive, ascending.
    ///
    /// Dates before the anchor are never produced; a window that ends
    /// before the anchor yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`RecurError::StepLimitExceeded`] if enumeration would take
    /// more than [`STEP_LIMIT`] steps.
    pub fn occurrences_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RecurResult<Vec<NaiveDate>> {
        match self.interpret() {
            Ok(desc) => self.collect(start, end, |k| nth_by_rule(&desc, self.anchor, k)),
            // Malformed descriptor: recover via pure stepping.
            Err(_) => self.collect(start, end, |k| self.nth_by_stepping(k)),
        }
    }

    /// Returns the first due date strictly after `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`RecurError::StepLimitExceeded`] if the seek would take
    /// more than [`STEP_LIMIT`] steps.
    pub fn next_after(&self, reference: NaiveDate) -> RecurResult<NaiveDate> {
        match self.interpret() {
            Ok(desc) => self.seek(reference, |k| nth_by_rule(&desc, self.anchor, k)),
            Err(_) => self.seek(reference, |k| self.nth_by_stepping(k)),
        }
    }

    /// Resolves the descriptor to interpret: the persisted text when
    /// present, otherwise the canonical descriptor built from the inputs.
    fn interpret(&self) -> Result<Descriptor, DescriptorError> {
        match self.descriptor.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.parse(),
            _ => Ok(Descriptor::build(self.anchor, self.cadence)),
        }
    }

    /// The k-th occurrence by pure calendar stepping from the anchor.
    ///
    /// Each date is computed as `advance(anchor, k * interval)` rather than
    /// by stepping the previous result, so a clamped month does not drag
    /// later occurrences down (Jan 31 -> Feb 28 -> Mar 31, not Mar 28).
    /// A month-end anchor stays pinned to month-end.
    fn nth_by_stepping(&self, k: u32) -> NaiveDate {
        let interval = self.cadence.interval();
        let steps = u64::from(k) * u64::from(interval);
        let date = match self.cadence.unit() {
            CadenceUnit::Day => stepper::add_days(self.anchor, steps),
            CadenceUnit::Week => stepper::add_days(self.anchor, steps * 7),
            CadenceUnit::Month => stepper::add_months(self.anchor, steps as i64),
            CadenceUnit::Year => stepper::add_months(self.anchor, steps as i64 * 12),
        };
        let month_end_anchored = matches!(
            self.cadence.unit(),
            CadenceUnit::Month | CadenceUnit::Year
        ) && stepper::is_last_day_of_month(self.anchor);
        if month_end_anchored {
            stepper::last_day_of_month(date)
        } else {
            date
        }
    }

    fn collect<F>(&self, start: NaiveDate, end: NaiveDate, nth: F) -> RecurResult<Vec<NaiveDate>>
    where
        F: Fn(u32) -> NaiveDate,
    {
        let mut out = Vec::new();
        if end < start || end < self.anchor {
            return Ok(out);
        }
        for k in 0..=STEP_LIMIT {
            let date = nth(k);
            if date > end {
                return Ok(out);
            }
            if date >= start && date >= self.anchor {
                out.push(date);
            }
        }
        Err(RecurError::StepLimitExceeded { limit: STEP_LIMIT })
    }

    fn seek<F>(&self, reference: NaiveDate, nth: F) -> RecurResult<NaiveDate>
    where
        F: Fn(u32) -> NaiveDate,
    {
        for k in 0..=STEP_LIMIT {
            let date = nth(k);
            if date > reference && date >= self.anchor {
                return Ok(date);
            }
        }
        Err(RecurError::StepLimitExceeded { limit: STEP_LIMIT })
    }
}

/// The k-th occurrence under descriptor semantics.
///
/// Dates are derived from the anchor and the rule, never from the previous
/// occurrence, so clamping in a short month cannot shift later dates.
/// `BYMONTHDAY` clamps in months too short for it; the month-end rule
/// pins to the last day of each target month.
fn nth_by_rule(desc: &Descriptor, anchor: NaiveDate, k: u32) -> NaiveDate {
    let steps = u64::from(k) * u64::from(desc.interval);
    match desc.frequency {
        Frequency::Daily => stepper::add_days(anchor, steps),
        Frequency::Weekly => {
            let start = align_weekday(anchor, desc.weekday.unwrap_or(anchor.weekday()));
            stepper::add_days(start, steps * 7)
        }
        Frequency::Monthly => {
            let base = stepper::add_months(anchor, steps as i64);
            apply_day_anchor(base, desc.day_anchor, anchor)
        }
        Frequency::Yearly => {
            let base = stepper::add_months(anchor, steps as i64 * 12);
            let base = set_month(base, desc.month.unwrap_or(anchor.month()));
            apply_day_anchor(base, desc.day_anchor, anchor)
        }
    }
}

/// First date on or after `from` falling on `weekday`.
fn align_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let offset = (7 + weekday.num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64)
        % 7;
    stepper::add_days(from, offset as u64)
}

fn set_month(date: NaiveDate, month: u32) -> NaiveDate {
    let day = date.day().min(stepper::days_in_month(date.year(), month));
    NaiveDate::from_ymd_opt(date.year(), month, day).unwrap_or(NaiveDate::MAX)
}

fn apply_day_anchor(date: NaiveDate, rule: Option<DayAnchor>, anchor: NaiveDate) -> NaiveDate {
    let day = match rule.unwrap_or(DayAnchor::MonthDay(anchor.day())) {
        DayAnchor::LastDay => stepper::days_in_month(date.year(), date.month()),
        DayAnchor::MonthDay(d) => d.min(stepper::days_in_month(date.year(), date.month())),
    };
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).unwrap_or(NaiveDate::MAX)
}
