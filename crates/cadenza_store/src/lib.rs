//! # Cadenza Store
//!
//! Transactional store for recurring-obligation series and their
//! materialized occurrences.
//!
//! This crate provides:
//! - The data model: [`Series`], [`Occurrence`], status enums, UUID ids
//! - [`SnapshotBackend`]: an opaque byte store for ledger snapshots
//! - [`Ledger`]: closure-based atomic transactions over the model, with
//!   the `(series_id, expense_date)` uniqueness constraint enforced at
//!   insert
//!
//! ## Transactions
//!
//! A transaction works on a private copy of the ledger state. When the
//! closure returns `Ok`, the new state is persisted to the backend and
//! swapped in atomically; on `Err` every pending write is discarded.
//! Writers are serialized, so a transaction never observes another
//! writer's partial state.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod ledger;
mod memory;
mod model;

pub use backend::SnapshotBackend;
pub use error::{StoreError, StoreResult};
pub use file::FileSnapshot;
pub use ledger::{Ledger, LedgerTxn};
pub use memory::InMemorySnapshot;
pub use model::{
    Occurrence, OccurrenceId, OccurrenceStatus, Series, SeriesId, SeriesSnapshot, SeriesStatus,
};
