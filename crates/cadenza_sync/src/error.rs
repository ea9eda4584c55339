//! Synchronizer error types.

use cadenza_recur::RecurError;
use cadenza_store::{SeriesId, StoreError};
use thiserror::Error;

/// Errors produced by synchronization and maintenance operations.
///
/// Finding the run marker already held is not an error; the engine reports
/// it as [`super::SyncOutcome::Skipped`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// The run marker could not be acquired or released for a reason other
    /// than being held.
    #[error("run marker unavailable: {source}")]
    LockUnavailable {
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Recurrence computation failed for a series.
    #[error("recurrence computation failed for series {series_id}: {source}")]
    Recur {
        /// The series being synchronized.
        series_id: SeriesId,
        /// Underlying recurrence failure.
        #[source]
        source: RecurError,
    },

    /// A store operation inside one series' transaction failed. The
    /// transaction is rolled back and the run stops.
    #[error("transaction for series {series_id} failed: {source}")]
    SeriesTransaction {
        /// The series being synchronized.
        series_id: SeriesId,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// A single series would have backfilled more rows than the hard cap
    /// allows. The series transaction is aborted and the run stops.
    #[error("backfill for series {series_id} exceeded the hard cap of {cap} rows")]
    HardCapExceeded {
        /// The offending series.
        series_id: SeriesId,
        /// The configured cap.
        cap: u32,
    },
}

impl SyncError {
    /// Creates a [`SyncError::LockUnavailable`].
    #[must_use]
    pub fn lock_unavailable(source: std::io::Error) -> Self {
        SyncError::LockUnavailable { source }
    }

    /// Creates a [`SyncError::Recur`].
    #[must_use]
    pub fn recur(series_id: SeriesId, source: RecurError) -> Self {
        SyncError::Recur { series_id, source }
    }

    /// Creates a [`SyncError::SeriesTransaction`].
    #[must_use]
    pub fn series_txn(series_id: SeriesId, source: StoreError) -> Self {
        SyncError::SeriesTransaction { series_id, source }
    }
}

/// Convenience alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
