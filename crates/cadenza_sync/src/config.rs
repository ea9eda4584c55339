//! Synchronizer configuration.

/// Default per-series cap on rows created by one backfill.
pub const DEFAULT_BACKFILL_CAP: u32 = 2000;

/// Tunable limits for a synchronizer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Maximum rows a single series may backfill in one run. A series
    /// needing more than this aborts its transaction; an anchor that far
    /// in the past indicates bad data, not missed runs.
    pub backfill_cap: u32,
}

impl SyncConfig {
    /// Returns the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the backfill cap.
    #[must_use]
    pub fn with_backfill_cap(mut self, cap: u32) -> Self {
        self.backfill_cap = cap;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backfill_cap: DEFAULT_BACKFILL_CAP,
        }
    }
}
