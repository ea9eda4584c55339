//! The transactional ledger.

use crate::backend::SnapshotBackend;
use crate::error::{StoreError, StoreResult};
use crate::memory::InMemorySnapshot;
use crate::model::{Occurrence, OccurrenceId, Series, SeriesId};
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot format version; bumped on incompatible layout changes.
const FORMAT_VERSION: u32 = 1;

/// The complete ledger contents plus derived indexes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    version: u32,
    series: BTreeMap<SeriesId, Series>,
    occurrences: BTreeMap<OccurrenceId, Occurrence>,
    /// Uniqueness index over `(series_id, expense_date)`. Derived; rebuilt
    /// after decode and maintained incrementally by transactions.
    #[serde(skip)]
    by_date: BTreeMap<(SeriesId, NaiveDate), OccurrenceId>,
}

impl LedgerState {
    fn reindex(&mut self) {
        self.by_date = self
            .occurrences
            .values()
            .map(|occ| ((occ.series_id, occ.expense_date), occ.id))
            .collect();
    }
}

/// The ledger: series and occurrences behind atomic closure transactions.
///
/// All writes go through [`Ledger::transaction`]. The closure receives a
/// [`LedgerTxn`] working on a private copy of the state; returning `Ok`
/// persists the new state to the backend and swaps it in, returning `Err`
/// discards every pending write. Writers are serialized.
pub struct Ledger {
    backend: Box<dyn SnapshotBackend>,
    state: RwLock<LedgerState>,
    /// Single-writer guarantee for transactions.
    write_lock: Mutex<()>,
}

impl Ledger {
    /// Opens a ledger over the given backend, loading any existing
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the snapshot cannot be
    /// decoded.
    pub fn open(backend: Box<dyn SnapshotBackend>) -> StoreResult<Self> {
        let mut state = match backend.load()? {
            Some(bytes) => decode_state(&bytes)?,
            None => LedgerState {
                version: FORMAT_VERSION,
                ..LedgerState::default()
            },
        };
        state.reindex();
        Ok(Self {
            backend,
            state: RwLock::new(state),
            write_lock: Mutex::new(()),
        })
    }

    /// Opens an ephemeral in-memory ledger.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(InMemorySnapshot::new()),
            state: RwLock::new(LedgerState {
                version: FORMAT_VERSION,
                ..LedgerState::default()
            }),
            write_lock: Mutex::new(()),
        }
    }

    /// Runs a transaction.
    ///
    /// The closure's writes are applied atomically when it returns `Ok`:
    /// the new state is persisted to the backend first, then swapped in.
    /// On `Err` (or a persist failure) the in-memory state is untouched.
    ///
    /// The error type only needs a conversion from [`StoreError`], so
    /// callers can thread their own error enums through the closure.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut LedgerTxn) -> Result<T, E>,
    {
        let _guard = self.write_lock.lock();
        let mut txn = LedgerTxn {
            state: self.state.read().clone(),
            dirty: false,
        };
        let out = f(&mut txn)?;
        if txn.dirty {
            let bytes = encode_state(&txn.state).map_err(E::from)?;
            self.backend.persist(&bytes).map_err(E::from)?;
            *self.state.write() = txn.state;
        }
        Ok(out)
    }

    /// Returns a series by id.
    #[must_use]
    pub fn series(&self, id: SeriesId) -> Option<Series> {
        self.state.read().series.get(&id).cloned()
    }

    /// Returns all series, ordered by id.
    #[must_use]
    pub fn list_series(&self) -> Vec<Series> {
        self.state.read().series.values().cloned().collect()
    }

    /// Returns an occurrence by id.
    #[must_use]
    pub fn occurrence(&self, id: OccurrenceId) -> Option<Occurrence> {
        self.state.read().occurrences.get(&id).cloned()
    }

    /// Returns all occurrences of a series, ascending by due date.
    #[must_use]
    pub fn occurrences_for(&self, series_id: SeriesId) -> Vec<Occurrence> {
        let state = self.state.read();
        state
            .by_date
            .range((series_id, NaiveDate::MIN)..=(series_id, NaiveDate::MAX))
            .filter_map(|(_, id)| state.occurrences.get(id).cloned())
            .collect()
    }

    /// Returns all occurrences due within `[start, end]` across every
    /// series, ascending by due date.
    #[must_use]
    pub fn occurrences_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Occurrence> {
        let state = self.state.read();
        let mut out: Vec<Occurrence> = state
            .occurrences
            .values()
            .filter(|occ| occ.expense_date >= start && occ.expense_date <= end)
            .cloned()
            .collect();
        out.sort_by_key(|occ| (occ.expense_date, occ.series_id));
        out
    }

    /// Returns the number of series.
    #[must_use]
    pub fn series_count(&self) -> usize {
        self.state.read().series.len()
    }

    /// Returns the number of occurrences.
    #[must_use]
    pub fn occurrence_count(&self) -> usize {
        self.state.read().occurrences.len()
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("series", &self.series_count())
            .field("occurrences", &self.occurrence_count())
            .finish_non_exhaustive()
    }
}

/// A write transaction over a private copy of the ledger state.
///
/// Reads observe the transaction's own pending writes. Nothing is visible
/// outside the transaction until the closure returns `Ok`.
pub struct LedgerTxn {
    state: LedgerState,
    dirty: bool,
}

impl LedgerTxn {
    /// Returns a series by id.
    #[must_use]
    pub fn series(&self, id: SeriesId) -> Option<&Series> {
        self.state.series.get(&id)
    }

    /// Iterates over all series, ordered by id.
    pub fn list_series(&self) -> impl Iterator<Item = &Series> {
        self.state.series.values()
    }

    /// Inserts a new series.
    ///
    /// # Errors
    ///
    /// Fails if a series with the same id already exists.
    pub fn insert_series(&mut self, series: Series) -> StoreResult<()> {
        if self.state.series.contains_key(&series.id) {
            return Err(StoreError::invalid_operation(format!(
                "series {} already exists",
                series.id
            )));
        }
        self.state.series.insert(series.id, series);
        self.dirty = true;
        Ok(())
    }

    /// Replaces an existing series.
    ///
    /// Existing occurrence snapshots are untouched by design.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SeriesNotFound`] if the series does not exist.
    pub fn update_series(&mut self, series: Series) -> StoreResult<()> {
        if !self.state.series.contains_key(&series.id) {
            return Err(StoreError::SeriesNotFound { id: series.id });
        }
        self.state.series.insert(series.id, series);
        self.dirty = true;
        Ok(())
    }

    /// Returns an occurrence by id.
    #[must_use]
    pub fn occurrence(&self, id: OccurrenceId) -> Option<&Occurrence> {
        self.state.occurrences.get(&id)
    }

    /// Returns the occurrence of `series_id` due exactly on `date`.
    #[must_use]
    pub fn occurrence_on(&self, series_id: SeriesId, date: NaiveDate) -> Option<&Occurrence> {
        let id = self.state.by_date.get(&(series_id, date))?;
        self.state.occurrences.get(id)
    }

    /// Returns the occurrences of `series_id` due strictly after `date`,
    /// ascending.
    #[must_use]
    pub fn future_occurrences(&self, series_id: SeriesId, date: NaiveDate) -> Vec<Occurrence> {
        self.state
            .by_date
            .range((series_id, date)..=(series_id, NaiveDate::MAX))
            .filter(|((_, due), _)| *due > date)
            .filter_map(|(_, id)| self.state.occurrences.get(id).cloned())
            .collect()
    }

    /// Returns all occurrences of `series_id`, ascending by due date.
    #[must_use]
    pub fn occurrences_for(&self, series_id: SeriesId) -> Vec<Occurrence> {
        self.state
            .by_date
            .range((series_id, NaiveDate::MIN)..=(series_id, NaiveDate::MAX))
            .filter_map(|(_, id)| self.state.occurrences.get(id).cloned())
            .collect()
    }

    /// Inserts a new occurrence.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SeriesNotFound`] if the owning series does not exist
    /// - [`StoreError::DuplicateOccurrence`] if the series already has an
    ///   occurrence on this date
    pub fn insert_occurrence(&mut self, occurrence: Occurrence) -> StoreResult<()> {
        if !self.state.series.contains_key(&occurrence.series_id) {
            return Err(StoreError::SeriesNotFound {
                id: occurrence.series_id,
            });
        }
        let key = (occurrence.series_id, occurrence.expense_date);
        if self.state.by_date.contains_key(&key) {
            return Err(StoreError::DuplicateOccurrence {
                series_id: occurrence.series_id,
                expense_date: occurrence.expense_date,
            });
        }
        self.state.by_date.insert(key, occurrence.id);
        self.state.occurrences.insert(occurrence.id, occurrence);
        self.dirty = true;
        Ok(())
    }

    /// Replaces an existing occurrence, re-keying the date index if the
    /// due date moved.
    ///
    /// # Errors
    ///
    /// - [`StoreError::OccurrenceNotFound`] if the occurrence does not exist
    /// - [`StoreError::DuplicateOccurrence`] if moving it would collide
    ///   with another occurrence of the same series
    pub fn update_occurrence(&mut self, occurrence: Occurrence) -> StoreResult<()> {
        let existing = self
            .state
            .occurrences
            .get(&occurrence.id)
            .ok_or(StoreError::OccurrenceNotFound { id: occurrence.id })?;

        let old_key = (existing.series_id, existing.expense_date);
        let new_key = (occurrence.series_id, occurrence.expense_date);
        if old_key != new_key {
            if self.state.by_date.contains_key(&new_key) {
                return Err(StoreError::DuplicateOccurrence {
                    series_id: occurrence.series_id,
                    expense_date: occurrence.expense_date,
                });
            }
            self.state.by_date.remove(&old_key);
            self.state.by_date.insert(new_key, occurrence.id);
        }
        self.state.occurrences.insert(occurrence.id, occurrence);
        self.dirty = true;
        Ok(())
    }

    /// Deletes an occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OccurrenceNotFound`] if it does not exist.
    pub fn delete_occurrence(&mut self, id: OccurrenceId) -> StoreResult<()> {
        let occurrence = self
            .state
            .occurrences
            .remove(&id)
            .ok_or(StoreError::OccurrenceNotFound { id })?;
        self.state
            .by_date
            .remove(&(occurrence.series_id, occurrence.expense_date));
        self.dirty = true;
        Ok(())
    }
}

fn encode_state(state: &LedgerState) -> StoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(state, &mut bytes).map_err(|e| StoreError::codec(e.to_string()))?;
    Ok(bytes)
}

fn decode_state(bytes: &[u8]) -> StoreResult<LedgerState> {
    let state: LedgerState =
        ciborium::from_reader(bytes).map_err(|e| StoreError::codec(e.to_string()))?;
    if state.version > FORMAT_VERSION {
        return Err(StoreError::codec(format!(
            "snapshot format version {} is newer than supported version {}",
            state.version, FORMAT_VERSION
        )));
    }
    Ok(state)
}
