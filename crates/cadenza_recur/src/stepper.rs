//! Calendar stepping with end-of-month clamping.
//!
//! The stepper is the lowest-level primitive in this crate: it adds N
//! cadence units to a date. For month and year units the day-of-month is
//! clamped to the target month's length, so adding one month to Jan 31
//! yields Feb 28 (or Feb 29 in a leap year), never a rollover into March.
//!
//! All functions are total over valid inputs. Results past the supported
//! calendar range saturate to [`NaiveDate::MAX`] rather than panicking;
//! callers enumerating occurrences treat such dates as "past any window".

use crate::cadence::CadenceUnit;
use chrono::{Datelike, Days, NaiveDate};

/// Adds `count` cadence units to `date`.
///
/// Day and week units use plain additive arithmetic. Month and year units
/// clamp the day-of-month to the last valid day of the target month.
///
/// # Example
///
/// ```rust
/// use cadenza_recur::{stepper, CadenceUnit};
/// use chrono::NaiveDate;
///
/// let jan31 = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
/// let feb28 = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
/// assert_eq!(stepper::advance(jan31, 1, CadenceUnit::Month), feb28);
/// ```
#[must_use]
pub fn advance(date: NaiveDate, count: u32, unit: CadenceUnit) -> NaiveDate {
    match unit {
        CadenceUnit::Day => add_days(date, u64::from(count)),
        CadenceUnit::Week => add_days(date, u64::from(count) * 7),
        CadenceUnit::Month => add_months(date, i64::from(count)),
        CadenceUnit::Year => add_months(date, i64::from(count) * 12),
    }
}

/// Adds whole days, saturating at the calendar bound.
#[must_use]
pub fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Adds whole months with day-of-month clamping.
#[must_use]
pub fn add_months(date: NaiveDate, months: i64) -> NaiveDate {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = match i32::try_from(total.div_euclid(12)) {
        Ok(y) => y,
        Err(_) => return NaiveDate::MAX,
    };
    // rem_euclid keeps the month in 0..12 even for negative totals
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}

/// Returns the number of days in the given month (1-12), leap-year aware.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Returns true if `date` falls on the last day of its month.
#[must_use]
pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.day() == days_in_month(date.year(), date.month())
}

/// Returns the last day of `date`'s month.
#[must_use]
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let day = days_in_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).unwrap_or(NaiveDate::MAX)
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn day_and_week_are_plain_arithmetic() {
        assert_eq!(advance(d(2025, 3, 1), 10, CadenceUnit::Day), d(2025, 3, 11));
        assert_eq!(advance(d(2025, 3, 1), 2, CadenceUnit::Week), d(2025, 3, 15));
        assert_eq!(advance(d(2025, 12, 30), 3, CadenceUnit::Day), d(2026, 1, 2));
    }

    #[test]
    fn month_addition_clamps_to_short_month() {
        assert_eq!(advance(d(2025, 1, 31), 1, CadenceUnit::Month), d(2025, 2, 28));
        assert_eq!(advance(d(2024, 1, 31), 1, CadenceUnit::Month), d(2024, 2, 29));
        assert_eq!(advance(d(2025, 3, 31), 1, CadenceUnit::Month), d(2025, 4, 30));
    }

    #[test]
    fn month_addition_does_not_roll_over() {
        // A naive day-preserving implementation would land on Mar 2/3 here.
        assert_eq!(advance(d(2025, 1, 30), 1, CadenceUnit::Month), d(2025, 2, 28));
    }

    #[test]
    fn month_addition_crosses_year_boundary() {
        assert_eq!(advance(d(2025, 11, 15), 3, CadenceUnit::Month), d(2026, 2, 15));
    }

    #[test]
    fn year_addition_clamps_leap_day() {
        assert_eq!(advance(d(2024, 2, 29), 1, CadenceUnit::Year), d(2025, 2, 28));
        assert_eq!(advance(d(2024, 2, 29), 4, CadenceUnit::Year), d(2028, 2, 29));
    }

    #[test]
    fn zero_count_is_identity() {
        let date = d(2025, 6, 30);
        for unit in [
            CadenceUnit::Day,
            CadenceUnit::Week,
            CadenceUnit::Month,
            CadenceUnit::Year,
        ] {
            assert_eq!(advance(date, 0, unit), date);
        }
    }

    #[test]
    fn days_in_month_table() {
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2100, 2), 28); // century, not leap
        assert_eq!(days_in_month(2000, 2), 29); // divisible by 400
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn last_day_detection() {
        assert!(is_last_day_of_month(d(2025, 2, 28)));
        assert!(is_last_day_of_month(d(2024, 2, 29)));
        assert!(!is_last_day_of_month(d(2024, 2, 28)));
        assert!(is_last_day_of_month(d(2025, 1, 31)));
        assert!(!is_last_day_of_month(d(2025, 1, 30)));
        assert_eq!(last_day_of_month(d(2025, 4, 2)), d(2025, 4, 30));
    }

    #[test]
    fn overflow_saturates_instead_of_panicking() {
        let far = advance(NaiveDate::MAX, 12, CadenceUnit::Month);
        assert_eq!(far, NaiveDate::MAX);
        let far = advance(NaiveDate::MAX, 1, CadenceUnit::Day);
        assert_eq!(far, NaiveDate::MAX);
    }
}
