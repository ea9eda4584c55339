//! Snapshot backend trait definition.

use crate::error::StoreResult;

/// An opaque byte store for ledger snapshots.
///
/// Backends do not interpret the data they hold; the ledger owns the
/// snapshot format. A backend stores exactly one snapshot: each `persist`
/// replaces the previous one atomically.
///
/// # Invariants
///
/// - `load` returns the bytes of the most recent successful `persist`,
///   or `None` if nothing was ever persisted
/// - `persist` is all-or-nothing: a crash mid-write must leave either the
///   old snapshot or the new one, never a torn mix
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemorySnapshot`] - For testing and ephemeral ledgers
/// - [`super::FileSnapshot`] - For persistent storage
pub trait SnapshotBackend: Send + Sync {
    /// Loads the current snapshot, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn load(&self) -> StoreResult<Option<Vec<u8>>>;

    /// Replaces the stored snapshot with `data`.
    ///
    /// After this returns successfully the snapshot is durable to the
    /// backend's guarantees.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn persist(&self, data: &[u8]) -> StoreResult<()>;
}
