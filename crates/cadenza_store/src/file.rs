//! File-backed snapshot persistence.

use crate::backend::SnapshotBackend;
use crate::error::StoreResult;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// A snapshot backend persisting to a single file.
///
/// Writes use the write-then-rename pattern for crash safety:
/// 1. Write to a temporary sibling file
/// 2. Sync the temporary file to disk
/// 3. Rename it over the snapshot file
/// 4. Fsync the parent directory so the rename itself is durable
///
/// A crash at any point leaves either the previous snapshot or the new
/// one intact.
#[derive(Debug)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    /// Creates a backend for the given snapshot file path.
    ///
    /// The file does not need to exist yet; the parent directory is
    /// created on first persist if missing.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    #[cfg(unix)]
    fn sync_parent_dir(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                File::open(parent)?.sync_all()?;
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_parent_dir(&self) -> StoreResult<()> {
        // Windows NTFS journaling covers metadata durability
        Ok(())
    }
}

impl SnapshotBackend for FileSnapshot {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut file = File::open(&self.path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        if data.is_empty() {
            return Ok(None);
        }
        Ok(Some(data))
    }

    fn persist(&self, data: &[u8]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        let mut file = File::create(&temp)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp, &self.path)?;
        self.sync_parent_dir()?;
        Ok(())
    }
}
