//! In-memory snapshot backend for testing.

use crate::backend::SnapshotBackend;
use crate::error::StoreResult;
use parking_lot::RwLock;

/// An in-memory snapshot backend.
///
/// Suitable for unit tests, integration tests, and ephemeral ledgers that
/// do not need persistence.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
#[derive(Debug, Default)]
pub struct InMemorySnapshot {
    data: RwLock<Option<Vec<u8>>>,
}

impl InMemorySnapshot {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-loaded with snapshot bytes.
    ///
    /// Useful for testing recovery scenarios.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(data)),
        }
    }

    /// Returns a copy of the stored snapshot, if any.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }
}

impl SnapshotBackend for InMemorySnapshot {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    fn persist(&self, data: &[u8]) -> StoreResult<()> {
        *self.data.write() = Some(data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_backend_is_empty() {
        let backend = InMemorySnapshot::new();
        assert!(backend.load().unwrap().is_none());
    }

    #[test]
    fn persist_then_load_round_trips() {
        let backend = InMemorySnapshot::new();
        backend.persist(b"snapshot-1").unwrap();
        assert_eq!(backend.load().unwrap().unwrap(), b"snapshot-1");

        backend.persist(b"snapshot-2").unwrap();
        assert_eq!(backend.load().unwrap().unwrap(), b"snapshot-2");
    }

    #[test]
    fn with_data_preloads() {
        let backend = InMemorySnapshot::with_data(b"seed".to_vec());
        assert_eq!(backend.load().unwrap().unwrap(), b"seed");
    }
}
