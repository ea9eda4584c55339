//! The synchronizer.
//!
//! One run walks every active series and, inside one transaction per
//! series, makes the ledger agree with the series definition:
//!
//! 1. Backfill: every due date from the anchor through today gets an
//!    occurrence row if it does not already have one.
//! 2. Future rows: exactly one occurrence strictly after today. Missing
//!    means a pending one is created; surplus rows are pruned keeping the
//!    earliest, whatever its status.
//! 3. Anchor sync: the series anchor is moved to the future row's due
//!    date, and the cached descriptor text is refreshed when stale.
//!
//! A failure in any series aborts that series' transaction and stops the
//! run; series already committed keep their rows.

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::lock::ExclusiveMarker;
use cadenza_store::{Ledger, Occurrence, SeriesId, StoreError};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one synchronizer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another holder had the run marker; nothing was done.
    Skipped,
    /// The run completed.
    Completed(SyncReport),
}

/// Counters from a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Active series visited.
    pub series_processed: usize,
    /// Occurrence rows created (backfill plus future rows).
    pub rows_created: usize,
    /// Surplus future rows deleted.
    pub rows_pruned: usize,
}

/// The ledger synchronization engine.
pub struct Synchronizer {
    ledger: Arc<Ledger>,
    marker: Box<dyn ExclusiveMarker>,
    clock: Box<dyn Clock>,
    config: SyncConfig,
}

impl Synchronizer {
    /// Creates a synchronizer with the default configuration.
    #[must_use]
    pub fn new(
        ledger: Arc<Ledger>,
        marker: Box<dyn ExclusiveMarker>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            marker,
            clock,
            config: SyncConfig::default(),
        }
    }

    /// Overrides the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs one synchronization pass.
    ///
    /// # Errors
    ///
    /// Returns the first series failure encountered; see [`SyncError`].
    /// A held run marker is not a failure and yields
    /// [`SyncOutcome::Skipped`].
    pub fn run(&self) -> SyncResult<SyncOutcome> {
        let Some(_guard) = self.marker.try_acquire()? else {
            info!("run marker held elsewhere, skipping");
            return Ok(SyncOutcome::Skipped);
        };

        let today = self.clock.today();
        let mut report = SyncReport::default();

        for series in self.ledger.list_series() {
            if !series.status.is_active() {
                continue;
            }
            if series.anchor_date.is_none() {
                debug!(series = %series.id, "no anchor date, skipping");
                continue;
            }
            let (created, pruned) = self.sync_series(series.id, today)?;
            report.series_processed += 1;
            report.rows_created += created;
            report.rows_pruned += pruned;
        }

        info!(
            series = report.series_processed,
            created = report.rows_created,
            pruned = report.rows_pruned,
            "synchronization complete"
        );
        Ok(SyncOutcome::Completed(report))
    }

    /// Synchronizes one series inside its own transaction.
    fn sync_series(&self, series_id: SeriesId, today: NaiveDate) -> SyncResult<(usize, usize)> {
        let cap = self.config.backfill_cap;
        self.ledger.transaction(|txn| {
            let store = |source: StoreError| SyncError::series_txn(series_id, source);
            let mut series = txn
                .series(series_id)
                .cloned()
                .ok_or_else(|| store(StoreError::SeriesNotFound { id: series_id }))?;
            let Some(schedule) = series.schedule() else {
                return Ok((0, 0));
            };
            let anchor = schedule.anchor;
            let mut created = 0_usize;
            let mut pruned = 0_usize;

            // 1. Backfill [anchor, today].
            let due = schedule
                .occurrences_between(anchor, today)
                .map_err(|source| SyncError::recur(series_id, source))?;
            for date in due {
                if txn.occurrence_on(series_id, date).is_some() {
                    continue;
                }
                if created as u32 >= cap {
                    return Err(SyncError::HardCapExceeded { series_id, cap });
                }
                txn.insert_occurrence(Occurrence::pending(&series, date))
                    .map_err(store)?;
                created += 1;
            }

            // 2. Exactly one row strictly after today, earliest wins.
            let future = txn.future_occurrences(series_id, today);
            let next_date = if let Some((keep, surplus)) = future.split_first() {
                for extra in surplus {
                    txn.delete_occurrence(extra.id).map_err(store)?;
                    pruned += 1;
                }
                keep.expense_date
            } else {
                let next = schedule
                    .next_after(today)
                    .map_err(|source| SyncError::recur(series_id, source))?;
                txn.insert_occurrence(Occurrence::pending(&series, next))
                    .map_err(store)?;
                created += 1;
                next
            };

            // 3. Anchor and descriptor sync.
            let mut changed = false;
            if series.anchor_date != Some(next_date) {
                series.anchor_date = Some(next_date);
                changed = true;
            }
            let canonical = series.canonical_descriptor();
            if series.descriptor != canonical {
                series.descriptor = canonical;
                changed = true;
            }
            if changed {
                series.updated_at = Some(Utc::now());
                txn.update_series(series).map_err(store)?;
            }

            debug!(series = %series_id, created, pruned, "series synchronized");
            Ok((created, pruned))
        })
    }

    /// Returns the ledger this synchronizer operates on.
    #[must_use]
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::lock::LocalMarker;
    use cadenza_recur::{Cadence, CadenceUnit};
    use cadenza_store::{OccurrenceStatus, Series, SeriesStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cadence(interval: u32, unit: CadenceUnit) -> Cadence {
        Cadence::new(interval, unit).unwrap()
    }

    fn seeded_ledger(series: Series) -> Arc<Ledger> {
        let ledger = Arc::new(Ledger::in_memory());
        ledger
            .transaction::<_, StoreError, _>(|txn| txn.insert_series(series))
            .unwrap();
        ledger
    }

    fn synchronizer(ledger: Arc<Ledger>, today: NaiveDate) -> Synchronizer {
        Synchronizer::new(
            ledger,
            Box::new(LocalMarker::new()),
            Box::new(FixedClock::new(today)),
        )
    }

    fn run_completed(sync: &Synchronizer) -> SyncReport {
        match sync.run().unwrap() {
            SyncOutcome::Completed(report) => report,
            SyncOutcome::Skipped => panic!("run was skipped"),
        }
    }

    #[test]
    fn backfills_history_and_creates_single_future_row() {
        let series = Series::new(
            "Gym",
            4_500,
            cadence(1, CadenceUnit::Month),
            Some(date(2025, 1, 15)),
        );
        let id = series.id;
        let ledger = seeded_ledger(series);
        let sync = synchronizer(Arc::clone(&ledger), date(2025, 3, 20));

        let report = run_completed(&sync);
        assert_eq!(report.series_processed, 1);
        assert_eq!(report.rows_created, 4);
        assert_eq!(report.rows_pruned, 0);

        let dates: Vec<NaiveDate> = ledger
            .occurrences_for(id)
            .iter()
            .map(|o| o.expense_date)
            .collect();
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 15),
                date(2025, 2, 15),
                date(2025, 3, 15),
                date(2025, 4, 15),
            ]
        );

        let series = ledger.series(id).unwrap();
        assert_eq!(series.anchor_date, Some(date(2025, 4, 15)));
        assert_eq!(
            series.descriptor.as_deref(),
            Some("FREQ=MONTHLY;INTERVAL=1;BYMONTHDAY=15")
        );
        assert!(series.updated_at.is_some());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let series = Series::new(
            "Gym",
            4_500,
            cadence(1, CadenceUnit::Month),
            Some(date(2025, 1, 15)),
        );
        let ledger = seeded_ledger(series);
        let sync = synchronizer(Arc::clone(&ledger), date(2025, 3, 20));

        run_completed(&sync);
        let before = ledger.occurrence_count();
        let report = run_completed(&sync);
        assert_eq!(report.rows_created, 0);
        assert_eq!(report.rows_pruned, 0);
        assert_eq!(ledger.occurrence_count(), before);
    }

    #[test]
    fn month_end_anchor_stays_pinned_to_month_end() {
        let series = Series::new(
            "Rent",
            120_000,
            cadence(1, CadenceUnit::Month),
            Some(date(2025, 1, 31)),
        );
        let id = series.id;
        let ledger = seeded_ledger(series);
        let sync = synchronizer(Arc::clone(&ledger), date(2025, 4, 10));

        run_completed(&sync);
        let dates: Vec<NaiveDate> = ledger
            .occurrences_for(id)
            .iter()
            .map(|o| o.expense_date)
            .collect();
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 31),
                date(2025, 4, 30),
            ]
        );
        let series = ledger.series(id).unwrap();
        assert_eq!(series.anchor_date, Some(date(2025, 4, 30)));
        assert_eq!(
            series.descriptor.as_deref(),
            Some("FREQ=MONTHLY;INTERVAL=1;BYMONTHDAY=28,29,30,31;BYSETPOS=-1")
        );
    }

    #[test]
    fn surplus_future_rows_are_pruned_keeping_the_earliest() {
        let series = Series::new(
            "Music",
            999,
            cadence(1, CadenceUnit::Month),
            Some(date(2025, 4, 5)),
        );
        let id = series.id;
        let ledger = seeded_ledger(series.clone());
        ledger
            .transaction::<_, StoreError, _>(|txn| {
                txn.insert_occurrence(Occurrence::pending(&series, date(2025, 4, 5)))?;
                txn.insert_occurrence(Occurrence::pending(&series, date(2025, 5, 5)))?;
                txn.insert_occurrence(Occurrence::pending(&series, date(2025, 6, 5)))
            })
            .unwrap();

        let sync = synchronizer(Arc::clone(&ledger), date(2025, 3, 20));
        let report = run_completed(&sync);
        assert_eq!(report.rows_pruned, 2);

        let future: Vec<NaiveDate> = ledger
            .occurrences_for(id)
            .iter()
            .filter(|o| o.expense_date > date(2025, 3, 20))
            .map(|o| o.expense_date)
            .collect();
        assert_eq!(future, vec![date(2025, 4, 5)]);
        assert_eq!(
            ledger.series(id).unwrap().anchor_date,
            Some(date(2025, 4, 5))
        );
    }

    #[test]
    fn earliest_future_row_wins_even_when_finalized() {
        let series = Series::new(
            "Hosting",
            500,
            cadence(1, CadenceUnit::Month),
            Some(date(2025, 4, 5)),
        );
        let id = series.id;
        let ledger = seeded_ledger(series.clone());
        ledger
            .transaction::<_, StoreError, _>(|txn| {
                let mut paid_early = Occurrence::pending(&series, date(2025, 4, 5));
                paid_early.status = OccurrenceStatus::Verified;
                txn.insert_occurrence(paid_early)?;
                txn.insert_occurrence(Occurrence::pending(&series, date(2025, 5, 5)))
            })
            .unwrap();

        let sync = synchronizer(Arc::clone(&ledger), date(2025, 3, 20));
        let report = run_completed(&sync);
        assert_eq!(report.rows_pruned, 1);

        // Exactly one row remains after today, and the anchor matches it.
        let future: Vec<Occurrence> = ledger
            .occurrences_for(id)
            .into_iter()
            .filter(|occ| occ.expense_date > date(2025, 3, 20))
            .collect();
        assert_eq!(future.len(), 1);
        assert_eq!(future[0].expense_date, date(2025, 4, 5));
        assert_eq!(future[0].status, OccurrenceStatus::Verified);
        assert_eq!(
            ledger.series(id).unwrap().anchor_date,
            Some(date(2025, 4, 5))
        );
    }

    #[test]
    fn hard_cap_aborts_the_series_transaction() {
        let series = Series::new(
            "Coffee",
            350,
            cadence(1, CadenceUnit::Day),
            Some(date(2025, 1, 1)),
        );
        let id = series.id;
        let ledger = seeded_ledger(series);
        let sync = synchronizer(Arc::clone(&ledger), date(2025, 2, 1))
            .with_config(SyncConfig::new().with_backfill_cap(5));

        let err = sync.run().unwrap_err();
        assert!(matches!(
            err,
            SyncError::HardCapExceeded { cap: 5, series_id } if series_id == id
        ));
        // Nothing was committed for the failed series.
        assert_eq!(ledger.occurrence_count(), 0);
        assert_eq!(
            ledger.series(id).unwrap().anchor_date,
            Some(date(2025, 1, 1))
        );
    }

    #[test]
    fn held_marker_skips_without_touching_the_store() {
        let series = Series::new(
            "Gym",
            4_500,
            cadence(1, CadenceUnit::Month),
            Some(date(2025, 1, 15)),
        );
        let ledger = seeded_ledger(series);
        let marker = LocalMarker::new();
        let _held = marker.try_acquire().unwrap().unwrap();

        let sync = Synchronizer::new(
            Arc::clone(&ledger),
            Box::new(marker.clone()),
            Box::new(FixedClock::new(date(2025, 3, 20))),
        );
        assert_eq!(sync.run().unwrap(), SyncOutcome::Skipped);
        assert_eq!(ledger.occurrence_count(), 0);
    }

    #[test]
    fn marker_is_released_after_the_run() {
        let series = Series::new(
            "Gym",
            4_500,
            cadence(1, CadenceUnit::Month),
            Some(date(2025, 1, 15)),
        );
        let ledger = seeded_ledger(series);
        let marker = LocalMarker::new();
        let sync = Synchronizer::new(
            Arc::clone(&ledger),
            Box::new(marker.clone()),
            Box::new(FixedClock::new(date(2025, 3, 20))),
        );
        run_completed(&sync);
        assert!(!marker.is_held());
    }

    #[test]
    fn inactive_and_anchorless_series_are_skipped() {
        let mut paused = Series::new(
            "Paused",
            100,
            cadence(1, CadenceUnit::Month),
            Some(date(2025, 1, 1)),
        );
        paused.status = SeriesStatus::Paused;
        let anchorless = Series::new("Anchorless", 100, cadence(1, CadenceUnit::Month), None);

        let ledger = Arc::new(Ledger::in_memory());
        ledger
            .transaction::<_, StoreError, _>(|txn| {
                txn.insert_series(paused)?;
                txn.insert_series(anchorless)
            })
            .unwrap();

        let sync = synchronizer(Arc::clone(&ledger), date(2025, 3, 20));
        let report = run_completed(&sync);
        assert_eq!(report.series_processed, 0);
        assert_eq!(ledger.occurrence_count(), 0);
    }

    #[test]
    fn advancing_clock_rolls_the_anchor_forward() {
        let series = Series::new(
            "Gym",
            4_500,
            cadence(1, CadenceUnit::Month),
            Some(date(2025, 1, 15)),
        );
        let id = series.id;
        let ledger = seeded_ledger(series);
        let clock = Arc::new(FixedClock::new(date(2025, 3, 20)));

        struct SharedClock(Arc<FixedClock>);
        impl Clock for SharedClock {
            fn today(&self) -> NaiveDate {
                self.0.today()
            }
        }

        let sync = Synchronizer::new(
            Arc::clone(&ledger),
            Box::new(LocalMarker::new()),
            Box::new(SharedClock(Arc::clone(&clock))),
        );
        run_completed(&sync);
        assert_eq!(
            ledger.series(id).unwrap().anchor_date,
            Some(date(2025, 4, 15))
        );

        clock.set(date(2025, 4, 20));
        let report = run_completed(&sync);
        // Apr 15 moved into the past; one new future row for May 15.
        assert_eq!(report.rows_created, 1);
        assert_eq!(
            ledger.series(id).unwrap().anchor_date,
            Some(date(2025, 5, 15))
        );
    }
}
