//! Ledger data model: series and occurrences.

use cadenza_recur::{Cadence, Descriptor, Schedule};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SeriesId(Uuid);

impl SeriesId {
    /// Creates a new random series id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a series id from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SeriesId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an occurrence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OccurrenceId(Uuid);

impl OccurrenceId {
    /// Creates a new random occurrence id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an occurrence id from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OccurrenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesStatus {
    /// The series is advanced by the synchronizer.
    Active,
    /// Temporarily suspended; not advanced.
    Paused,
    /// Permanently ended; not advanced.
    Canceled,
}

impl SeriesStatus {
    /// Returns true if the synchronizer should advance this series.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, SeriesStatus::Active)
    }
}

/// Lifecycle status of an occurrence.
///
/// `Pending` is the only initial state; every other status is terminal as
/// far as this crate is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatus {
    /// Materialized but not yet confirmed.
    Pending,
    /// Confirmed as paid/settled.
    Verified,
    /// Acknowledged and deliberately disregarded.
    Ignored,
    /// This occurrence did not happen.
    Skipped,
    /// The obligation was cancelled at this occurrence.
    Cancelled,
}

impl OccurrenceStatus {
    /// Returns true if this occurrence still awaits finalization.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, OccurrenceStatus::Pending)
    }
}

/// A recurring obligation definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Unique id.
    pub id: SeriesId,
    /// Human-readable name ("Gym membership").
    pub name: String,
    /// Billing provider, if known.
    pub provider: Option<String>,
    /// Payment method description, if known.
    pub payment_method: Option<String>,
    /// Provider contact, if known.
    pub contact_email: Option<String>,
    /// Expected amount per occurrence, in cents.
    pub amount_cents: i64,
    /// Lifecycle status.
    pub status: SeriesStatus,
    /// Recurrence spacing.
    pub cadence: Cadence,
    /// The next due date not yet materialized, or the single materialized
    /// future due date once synchronized. `None` means the series cannot
    /// be advanced.
    pub anchor_date: Option<NaiveDate>,
    /// Cached canonical descriptor text; recomputed when stale.
    pub descriptor: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Series {
    /// Creates an active series with the given cadence and anchor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        amount_cents: i64,
        cadence: Cadence,
        anchor_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: SeriesId::new(),
            name: name.into(),
            provider: None,
            payment_method: None,
            contact_email: None,
            amount_cents,
            status: SeriesStatus::Active,
            cadence,
            anchor_date,
            descriptor: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Sets the provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the payment method.
    #[must_use]
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    /// Returns the schedule view the occurrence calculator consumes, or
    /// `None` when the series has no anchor date.
    #[must_use]
    pub fn schedule(&self) -> Option<Schedule> {
        let anchor = self.anchor_date?;
        let mut schedule = Schedule::new(anchor, self.cadence);
        if let Some(text) = &self.descriptor {
            schedule = schedule.with_descriptor(text.clone());
        }
        Some(schedule)
    }

    /// Returns the canonical descriptor text for the current cadence and
    /// anchor, or `None` when the series has no anchor date.
    #[must_use]
    pub fn canonical_descriptor(&self) -> Option<String> {
        self.anchor_date
            .map(|anchor| Descriptor::canonical_text(anchor, self.cadence))
    }

    /// Copies the billing fields into an immutable snapshot value.
    #[must_use]
    pub fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot {
            name: self.name.clone(),
            provider: self.provider.clone(),
            payment_method: self.payment_method.clone(),
            amount_cents: self.amount_cents,
            cadence: self.cadence,
        }
    }
}

/// Series fields copied onto an occurrence at creation time.
///
/// The copy is deliberate: later edits to the series must not rewrite
/// history, so occurrences never reference the live series for these
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    /// Series name at creation time.
    pub name: String,
    /// Provider at creation time.
    pub provider: Option<String>,
    /// Payment method at creation time.
    pub payment_method: Option<String>,
    /// Amount in cents at creation time.
    pub amount_cents: i64,
    /// Cadence at creation time.
    pub cadence: Cadence,
}

/// A materialized due date belonging to a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Unique id.
    pub id: OccurrenceId,
    /// Owning series.
    pub series_id: SeriesId,
    /// The due calendar date. Unique per `(series_id, expense_date)`.
    pub expense_date: NaiveDate,
    /// Lifecycle status.
    pub status: OccurrenceStatus,
    /// Series fields captured at creation time.
    pub snapshot: SeriesSnapshot,
    /// Free-form note set at finalization.
    pub note: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Finalization timestamp, if finalized.
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Occurrence {
    /// Creates a pending occurrence for `series` due on `expense_date`,
    /// snapshotting the series' current billing fields.
    #[must_use]
    pub fn pending(series: &Series, expense_date: NaiveDate) -> Self {
        Self {
            id: OccurrenceId::new(),
            series_id: series.id,
            expense_date,
            status: OccurrenceStatus::Pending,
            snapshot: series.snapshot(),
            note: None,
            created_at: Utc::now(),
            finalized_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_recur::CadenceUnit;

    fn monthly(interval: u32) -> Cadence {
        Cadence::new(interval, CadenceUnit::Month).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn schedule_requires_anchor() {
        let series = Series::new("Rent", 120_000, monthly(1), None);
        assert!(series.schedule().is_none());
        assert!(series.canonical_descriptor().is_none());
    }

    #[test]
    fn schedule_carries_cached_descriptor() {
        let mut series = Series::new("Rent", 120_000, monthly(1), Some(date(2025, 1, 31)));
        series.descriptor = series.canonical_descriptor();
        let schedule = series.schedule().unwrap();
        assert_eq!(
            schedule.descriptor.as_deref(),
            Some("FREQ=MONTHLY;INTERVAL=1;BYMONTHDAY=28,29,30,31;BYSETPOS=-1")
        );
    }

    #[test]
    fn snapshot_is_detached_from_series() {
        let series = Series::new("Music", 999, monthly(1), Some(date(2025, 3, 5)))
            .with_provider("Loudify");
        let occurrence = Occurrence::pending(&series, date(2025, 3, 5));

        let mut edited = series.clone();
        edited.name = "Music (family plan)".into();
        edited.amount_cents = 1499;

        assert_eq!(occurrence.snapshot.name, "Music");
        assert_eq!(occurrence.snapshot.amount_cents, 999);
        assert_eq!(occurrence.snapshot.provider.as_deref(), Some("Loudify"));
        assert!(occurrence.status.is_pending());
    }

    #[test]
    fn status_predicates() {
        assert!(SeriesStatus::Active.is_active());
        assert!(!SeriesStatus::Paused.is_active());
        assert!(!SeriesStatus::Canceled.is_active());
        assert!(OccurrenceStatus::Pending.is_pending());
        assert!(!OccurrenceStatus::Verified.is_pending());
    }
}
