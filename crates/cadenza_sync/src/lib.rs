//! # Cadenza Sync
//!
//! The synchronization engine that keeps a ledger consistent with its
//! series definitions.
//!
//! After a [`Synchronizer`] run, every active series with an anchor date
//! satisfies:
//! - every due date from the anchor through today has exactly one
//!   occurrence row
//! - exactly one occurrence exists strictly after today, created as
//!   pending when missing
//! - the series anchor equals that future occurrence's due date
//!
//! Runs are guarded by an exclusive marker so concurrent invocations (cron
//! overlap, a second process) degrade to a no-op instead of racing.
//!
//! The [`maintenance`] module carries the adjacent one-shot operations:
//! finalizing an occurrence and refreshing cached descriptor text.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod engine;
mod error;
mod lock;
pub mod maintenance;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{SyncConfig, DEFAULT_BACKFILL_CAP};
pub use engine::{SyncOutcome, SyncReport, Synchronizer};
pub use error::{SyncError, SyncResult};
pub use lock::{ExclusiveMarker, FileMarker, LocalMarker, MarkerGuard};
