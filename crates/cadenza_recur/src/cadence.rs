//! Cadence value types.

use crate::error::{RecurError, RecurResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The unit of a recurrence cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadenceUnit {
    /// Every N days.
    Day,
    /// Every N weeks.
    Week,
    /// Every N months.
    Month,
    /// Every N years.
    Year,
}

impl fmt::Display for CadenceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CadenceUnit::Day => "day",
            CadenceUnit::Week => "week",
            CadenceUnit::Month => "month",
            CadenceUnit::Year => "year",
        };
        f.write_str(s)
    }
}

impl FromStr for CadenceUnit {
    type Err = RecurError;

    /// Parses a unit name. Plural forms are accepted for compatibility
    /// with older persisted data.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "days" => Ok(CadenceUnit::Day),
            "week" | "weeks" => Ok(CadenceUnit::Week),
            "month" | "months" => Ok(CadenceUnit::Month),
            "year" | "years" => Ok(CadenceUnit::Year),
            other => Err(RecurError::Descriptor(
                crate::descriptor::DescriptorError::unsupported(format!(
                    "unknown cadence unit: {other}"
                )),
            )),
        }
    }
}

/// A recurrence cadence: a positive interval count and a unit.
///
/// The interval is validated at construction; a `Cadence` always has
/// `interval >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cadence {
    interval: u32,
    unit: CadenceUnit,
}

impl Cadence {
    /// Creates a cadence.
    ///
    /// # Errors
    ///
    /// Returns [`RecurError::ZeroInterval`] if `interval` is zero.
    pub fn new(interval: u32, unit: CadenceUnit) -> RecurResult<Self> {
        if interval == 0 {
            return Err(RecurError::ZeroInterval);
        }
        Ok(Self { interval, unit })
    }

    /// Returns the interval count (always >= 1).
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Returns the cadence unit.
    #[must_use]
    pub const fn unit(&self) -> CadenceUnit {
        self.unit
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {} {}(s)", self.interval, self.unit)
    }
}
