//! One-shot ledger maintenance operations.
//!
//! These sit beside the synchronizer: finalizing a pending occurrence and
//! refreshing cached descriptor text. Each runs in a single transaction.

use crate::error::{SyncError, SyncResult};
use cadenza_store::{Ledger, Occurrence, OccurrenceId, OccurrenceStatus, StoreError};
use chrono::Utc;
use tracing::{debug, info};

/// Finalizes a pending occurrence and rolls its series forward.
///
/// The occurrence's status becomes `status`, its note is set, and its
/// finalization timestamp is stamped. When the occurrence is the series'
/// current anchor row and the series is active, the anchor advances to the
/// next due date and a pending occurrence is created there (unless one
/// already exists).
///
/// Finalizing an occurrence that is no longer pending is a no-op; the
/// stored occurrence is returned unchanged.
///
/// # Errors
///
/// - [`StoreError::OccurrenceNotFound`] if `id` does not exist
/// - [`StoreError::InvalidOperation`] if `status` is
///   [`OccurrenceStatus::Pending`]
/// - recurrence or store failures while rolling the series forward
pub fn finalize_occurrence(
    ledger: &Ledger,
    id: OccurrenceId,
    status: OccurrenceStatus,
    note: Option<String>,
) -> SyncResult<Occurrence> {
    if status.is_pending() {
        return Err(StoreError::invalid_operation("cannot finalize an occurrence to pending").into());
    }
    ledger.transaction(|txn| {
        let mut occurrence = txn
            .occurrence(id)
            .cloned()
            .ok_or(StoreError::OccurrenceNotFound { id })?;
        if !occurrence.status.is_pending() {
            debug!(occurrence = %id, "already finalized, nothing to do");
            return Ok(occurrence);
        }

        occurrence.status = status;
        occurrence.note = note.clone();
        occurrence.finalized_at = Some(Utc::now());
        txn.update_occurrence(occurrence.clone())?;

        let mut series = txn
            .series(occurrence.series_id)
            .cloned()
            .ok_or(StoreError::SeriesNotFound {
                id: occurrence.series_id,
            })?;

        // Roll forward only when the finalized row was the upcoming one;
        // settling an old backfilled row must not move the anchor back.
        let was_anchor_row = series.anchor_date == Some(occurrence.expense_date);
        if series.status.is_active() && was_anchor_row {
            if let Some(schedule) = series.schedule() {
                let next = schedule
                    .next_after(occurrence.expense_date)
                    .map_err(|source| SyncError::recur(series.id, source))?;
                if txn.occurrence_on(series.id, next).is_none() {
                    txn.insert_occurrence(Occurrence::pending(&series, next))?;
                }
                series.anchor_date = Some(next);
                series.descriptor = series.canonical_descriptor();
                series.updated_at = Some(Utc::now());
                txn.update_series(series)?;
            }
        }

        info!(occurrence = %id, ?status, "occurrence finalized");
        Ok(occurrence)
    })
}

/// Rewrites stale cached descriptor text across all series.
///
/// A series is stale when its stored descriptor differs from the canonical
/// text derived from its anchor and cadence. With `dry_run` the count of
/// stale series is returned without writing anything.
///
/// # Errors
///
/// Returns store failures from the underlying transaction.
pub fn populate_descriptors(ledger: &Ledger, dry_run: bool) -> SyncResult<usize> {
    ledger.transaction(|txn| {
        let stale: Vec<_> = txn
            .list_series()
            .filter(|series| match series.canonical_descriptor() {
                Some(canonical) => series.descriptor.as_deref() != Some(canonical.as_str()),
                None => false,
            })
            .cloned()
            .collect();

        if dry_run {
            info!(stale = stale.len(), "descriptor dry run");
            return Ok(stale.len());
        }

        let count = stale.len();
        for mut series in stale {
            debug!(series = %series.id, "rewriting descriptor");
            series.descriptor = series.canonical_descriptor();
            series.updated_at = Some(Utc::now());
            txn.update_series(series)?;
        }
        info!(updated = count, "descriptors populated");
        Ok(count)
    })
}
