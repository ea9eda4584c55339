//! Canonical recurrence descriptors.
//!
//! A descriptor is the persisted, comparable encoding of a cadence plus its
//! anchoring rule. The text grammar is a compact RRULE-style token list:
//!
//! ```text
//! FREQ=<DAILY|WEEKLY|MONTHLY|YEARLY>;INTERVAL=<n>
//!     [;BYDAY=<code>][;BYMONTH=<n>][;BYMONTHDAY=<n,...>][;BYSETPOS=-1]
//! ```
//!
//! Building a descriptor from equal inputs always yields textually
//! identical output, which is how cadence-no-op updates are detected
//! without comparing structures.
//!
//! A month (or year) series anchored on the last calendar day of its month
//! is encoded as `BYMONTHDAY=28,29,30,31;BYSETPOS=-1` rather than a fixed
//! day-of-month, so the series keeps tracking month-end across varying
//! month lengths.

use crate::cadence::{Cadence, CadenceUnit};
use crate::stepper;
use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing or interpreting descriptor text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// A token did not match `KEY=VALUE` or held an unparsable value.
    #[error("malformed descriptor token: {token}")]
    MalformedToken {
        /// The offending token text.
        token: String,
    },

    /// The descriptor is syntactically valid but uses a rule this engine
    /// does not support.
    #[error("unsupported descriptor rule: {message}")]
    Unsupported {
        /// Description of the unsupported construct.
        message: String,
    },
}

impl DescriptorError {
    /// Creates a malformed-token error.
    pub fn malformed(token: impl Into<String>) -> Self {
        Self::MalformedToken {
            token: token.into(),
        }
    }

    /// Creates an unsupported-rule error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }
}

/// Frequency class of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Daily recurrence.
    Daily,
    /// Weekly recurrence.
    Weekly,
    /// Monthly recurrence.
    Monthly,
    /// Yearly recurrence.
    Yearly,
}

impl Frequency {
    fn token(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

/// Day-of-month anchoring rule for monthly and yearly descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayAnchor {
    /// A fixed day-of-month (1-31), clamped in shorter months.
    MonthDay(u32),
    /// The last calendar day of the month, whatever its length.
    LastDay,
}

/// A parsed canonical recurrence descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Frequency class.
    pub frequency: Frequency,
    /// Interval between occurrences, in frequency units.
    pub interval: u32,
    /// Anchored weekday (weekly only).
    pub weekday: Option<Weekday>,
    /// Anchored month 1-12 (yearly only).
    pub month: Option<u32>,
    /// Day-of-month rule (monthly and yearly).
    pub day_anchor: Option<DayAnchor>,
}

impl Descriptor {
    /// Derives the canonical descriptor for a cadence anchored at a date.
    #[must_use]
    pub fn build(anchor: NaiveDate, cadence: Cadence) -> Self {
        let interval = cadence.interval();
        let day_anchor = if stepper::is_last_day_of_month(anchor) {
            DayAnchor::LastDay
        } else {
            DayAnchor::MonthDay(anchor.day())
        };

        match cadence.unit() {
            CadenceUnit::Day => Self {
                frequency: Frequency::Daily,
                interval,
                weekday: None,
                month: None,
                day_anchor: None,
            },
            CadenceUnit::Week => Self {
                frequency: Frequency::Weekly,
                interval,
                weekday: Some(anchor.weekday()),
                month: None,
                day_anchor: None,
            },
            CadenceUnit::Month => Self {
                frequency: Frequency::Monthly,
                interval,
                weekday: None,
                month: None,
                day_anchor: Some(day_anchor),
            },
            CadenceUnit::Year => Self {
                frequency: Frequency::Yearly,
                interval,
                weekday: None,
                month: Some(anchor.month()),
                day_anchor: Some(day_anchor),
            },
        }
    }

    /// Returns the canonical text for a cadence + anchor without keeping
    /// the intermediate structure around.
    #[must_use]
    pub fn canonical_text(anchor: NaiveDate, cadence: Cadence) -> String {
        Self::build(anchor, cadence).to_string()
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={};INTERVAL={}", self.frequency.token(), self.interval)?;
        if let Some(weekday) = self.weekday {
            write!(f, ";BYDAY={}", weekday_code(weekday))?;
        }
        if let Some(month) = self.month {
            write!(f, ";BYMONTH={month}")?;
        }
        match self.day_anchor {
            Some(DayAnchor::MonthDay(day)) => write!(f, ";BYMONTHDAY={day}")?,
            Some(DayAnchor::LastDay) => write!(f, ";BYMONTHDAY=28,29,30,31;BYSETPOS=-1")?,
            None => {}
        }
        Ok(())
    }
}

impl FromStr for Descriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut frequency = None;
        let mut interval: Option<u32> = None;
        let mut weekday = None;
        let mut month = None;
        let mut month_days: Option<Vec<u32>> = None;
        let mut last_day_setpos = false;

        for token in s.split(';').filter(|t| !t.is_empty()) {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| DescriptorError::malformed(token))?;
            match key {
                "FREQ" => {
                    frequency = Some(match value {
                        "DAILY" => Frequency::Daily,
                        "WEEKLY" => Frequency::Weekly,
                        "MONTHLY" => Frequency::Monthly,
                        "YEARLY" => Frequency::Yearly,
                        other => {
                            return Err(DescriptorError::unsupported(format!(
                                "frequency {other}"
                            )))
                        }
                    });
                }
                "INTERVAL" => {
                    let n: u32 = value
                        .parse()
                        .map_err(|_| DescriptorError::malformed(token))?;
                    if n == 0 {
                        return Err(DescriptorError::malformed(token));
                    }
                    interval = Some(n);
                }
                "BYDAY" => {
                    weekday = Some(parse_weekday_code(value)?);
                }
                "BYMONTH" => {
                    let m: u32 = value
                        .parse()
                        .map_err(|_| DescriptorError::malformed(token))?;
                    if !(1..=12).contains(&m) {
                        return Err(DescriptorError::malformed(token));
                    }
                    month = Some(m);
                }
                "BYMONTHDAY" => {
                    let days = value
                        .split(',')
                        .map(|d| d.parse::<u32>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| DescriptorError::malformed(token))?;
                    if days.iter().any(|d| !(1..=31).contains(d)) {
                        return Err(DescriptorError::malformed(token));
                    }
                    month_days = Some(days);
                }
                "BYSETPOS" => {
                    if value != "-1" {
                        return Err(DescriptorError::unsupported(format!(
                            "BYSETPOS={value}"
                        )));
                    }
                    last_day_setpos = true;
                }
                other => {
                    return Err(DescriptorError::unsupported(format!("token {other}")));
                }
            }
        }

        let frequency =
            frequency.ok_or_else(|| DescriptorError::unsupported("missing FREQ"))?;

        let day_anchor = match (month_days, last_day_setpos) {
            (None, false) => None,
            (Some(days), true) => {
                // Only the month-end encoding uses BYSETPOS
                if days == [28, 29, 30, 31] {
                    Some(DayAnchor::LastDay)
                } else {
                    return Err(DescriptorError::unsupported(
                        "BYSETPOS with a day list other than 28,29,30,31",
                    ));
                }
            }
            (Some(days), false) => match days.as_slice() {
                [day] => Some(DayAnchor::MonthDay(*day)),
                _ => {
                    return Err(DescriptorError::unsupported(
                        "multiple BYMONTHDAY values without BYSETPOS=-1",
                    ))
                }
            },
            (None, true) => {
                return Err(DescriptorError::unsupported("BYSETPOS without BYMONTHDAY"))
            }
        };

        Ok(Self {
            frequency,
            interval: interval.unwrap_or(1),
            weekday,
            month,
            day_anchor,
        })
    }
}

fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "SU",
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
    }
}

fn parse_weekday_code(code: &str) -> Result<Weekday, DescriptorError> {
    match code {
        "SU" => Ok(Weekday::Sun),
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        other => Err(DescriptorError::unsupported(format!("BYDAY={other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cadence(interval: u32, unit: CadenceUnit) -> Cadence {
        Cadence::new(interval, unit).unwrap()
    }

    #[test]
    fn daily_text() {
        let desc = Descriptor::build(d(2025, 3, 5), cadence(3, CadenceUnit::Day));
        assert_eq!(desc.to_string(), "FREQ=DAILY;INTERVAL=3");
    }

    #[test]
    fn weekly_anchors_to_weekday() {
        // 2025-09-10 is a Wednesday
        let desc = Descriptor::build(d(2025, 9, 10), cadence(2, CadenceUnit::Week));
        assert_eq!(desc.to_string(), "FREQ=WEEKLY;INTERVAL=2;BYDAY=WE");
    }

    #[test]
    fn monthly_fixed_day() {
        let desc = Descriptor::build(d(2025, 9, 10), cadence(1, CadenceUnit::Month));
        assert_eq!(desc.to_string(), "FREQ=MONTHLY;INTERVAL=1;BYMONTHDAY=10");
    }

    #[test]
    fn monthly_last_day_special_case() {
        let desc = Descriptor::build(d(2025, 1, 31), cadence(1, CadenceUnit::Month));
        assert_eq!(
            desc.to_string(),
            "FREQ=MONTHLY;INTERVAL=1;BYMONTHDAY=28,29,30,31;BYSETPOS=-1"
        );
        // Feb 28 in a non-leap year is also a month-end anchor
        let desc = Descriptor::build(d(2025, 2, 28), cadence(1, CadenceUnit::Month));
        assert_eq!(
            desc.to_string(),
            "FREQ=MONTHLY;INTERVAL=1;BYMONTHDAY=28,29,30,31;BYSETPOS=-1"
        );
    }

    #[test]
    fn yearly_carries_month() {
        let desc = Descriptor::build(d(2025, 12, 10), cadence(1, CadenceUnit::Year));
        assert_eq!(
            desc.to_string(),
            "FREQ=YEARLY;INTERVAL=1;BYMONTH=12;BYMONTHDAY=10"
        );
        let desc = Descriptor::build(d(2025, 4, 30), cadence(2, CadenceUnit::Year));
        assert_eq!(
            desc.to_string(),
            "FREQ=YEARLY;INTERVAL=2;BYMONTH=4;BYMONTHDAY=28,29,30,31;BYSETPOS=-1"
        );
    }

    #[test]
    fn equal_inputs_build_identical_text() {
        let a = Descriptor::canonical_text(d(2025, 1, 31), cadence(1, CadenceUnit::Month));
        let b = Descriptor::canonical_text(d(2025, 1, 31), cadence(1, CadenceUnit::Month));
        assert_eq!(a, b);
    }

    #[test]
    fn parse_round_trips_built_descriptors() {
        let anchors = [d(2025, 1, 31), d(2025, 9, 10), d(2024, 2, 29), d(2025, 7, 1)];
        let cadences = [
            cadence(1, CadenceUnit::Day),
            cadence(2, CadenceUnit::Week),
            cadence(1, CadenceUnit::Month),
            cadence(3, CadenceUnit::Month),
            cadence(1, CadenceUnit::Year),
        ];
        for anchor in anchors {
            for c in cadences {
                let built = Descriptor::build(anchor, c);
                let text = built.to_string();
                let parsed: Descriptor = text.parse().unwrap();
                assert_eq!(parsed, built, "round trip failed for {text}");
            }
        }
    }

    #[test]
    fn parse_defaults_interval_to_one() {
        let desc: Descriptor = "FREQ=DAILY".parse().unwrap();
        assert_eq!(desc.interval, 1);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Descriptor>().is_err());
        assert!("FREQ=HOURLY;INTERVAL=1".parse::<Descriptor>().is_err());
        assert!("INTERVAL=2".parse::<Descriptor>().is_err());
        assert!("FREQ=DAILY;INTERVAL=0".parse::<Descriptor>().is_err());
        assert!("FREQ=DAILY;INTERVAL=x".parse::<Descriptor>().is_err());
        assert!("FREQ=WEEKLY;BYDAY=XX".parse::<Descriptor>().is_err());
        assert!("FREQ=MONTHLY;BYMONTHDAY=40".parse::<Descriptor>().is_err());
        assert!("FREQ=MONTHLY;BYMONTHDAY=1,15".parse::<Descriptor>().is_err());
        assert!("FREQ=MONTHLY;BYSETPOS=-1".parse::<Descriptor>().is_err());
        assert!("FREQ=MONTHLY;BYMONTHDAY=28,29,30,31;BYSETPOS=2"
            .parse::<Descriptor>()
            .is_err());
        assert!("FREQ=DAILY;COUNT=10".parse::<Descriptor>().is_err());
        assert!("FREQDAILY".parse::<Descriptor>().is_err());
    }
}
