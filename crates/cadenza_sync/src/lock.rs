//! Exclusive run marker.
//!
//! A synchronizer run holds the marker for its whole duration. A second
//! caller finding it held backs off without treating it as a failure.

use crate::error::{SyncError, SyncResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Proof of exclusive ownership. Released when dropped.
pub struct MarkerGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl MarkerGuard {
    /// Wraps a release action to run on drop.
    #[must_use]
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for MarkerGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for MarkerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerGuard").finish_non_exhaustive()
    }
}

/// Grants at most one [`MarkerGuard`] at a time.
pub trait ExclusiveMarker: Send + Sync {
    /// Attempts to take the marker.
    ///
    /// Returns `Ok(None)` when another holder has it; that is the expected
    /// contended outcome, not a failure.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LockUnavailable`] on an underlying failure
    /// other than contention.
    fn try_acquire(&self) -> SyncResult<Option<MarkerGuard>>;
}

/// A marker backed by an OS exclusive lock on a file.
///
/// The file is created if absent and locked with a non-blocking exclusive
/// lock, so a holder that dies without cleanup (crash, SIGKILL) releases
/// the lock with its process and never wedges later runs. The file itself
/// is removed on release as a courtesy.
#[derive(Debug)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    /// Creates a marker over the given lock file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExclusiveMarker for FileMarker {
    fn try_acquire(&self) -> SyncResult<Option<MarkerGuard>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(SyncError::lock_unavailable)?;
            }
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(SyncError::lock_unavailable)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(SyncError::lock_unavailable(e)),
        }

        let path = self.path.clone();
        Ok(Some(MarkerGuard::new(move || {
            // Best-effort cleanup; the OS drops the lock with the handle
            // either way.
            let _ = file.unlock();
            drop(file);
            let _ = fs::remove_file(&path);
        })))
    }
}

/// An in-process marker for tests and embedded use.
#[derive(Debug, Default, Clone)]
pub struct LocalMarker {
    held: Arc<AtomicBool>,
}

impl LocalMarker {
    /// Creates an unheld marker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a guard is outstanding.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

impl ExclusiveMarker for LocalMarker {
    fn try_acquire(&self) -> SyncResult<Option<MarkerGuard>> {
        if self
            .held
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(None);
        }
        let held = Arc::clone(&self.held);
        Ok(Some(MarkerGuard::new(move || {
            held.store(false, Ordering::SeqCst);
        })))
    }
}
