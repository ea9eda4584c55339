//! Sync command implementation.

use cadenza_store::{FileSnapshot, Ledger};
use cadenza_sync::{FileMarker, SyncOutcome, Synchronizer, SystemClock};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runs the sync command.
pub fn run(path: &Path, lock: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Arc::new(Ledger::open(Box::new(FileSnapshot::new(path)))?);
    let lock_path = lock.map(PathBuf::from).unwrap_or_else(|| default_lock_path(path));

    let synchronizer = Synchronizer::new(
        ledger,
        Box::new(FileMarker::new(lock_path)),
        Box::new(SystemClock),
    );

    match synchronizer.run()? {
        SyncOutcome::Skipped => {
            println!("Another run holds the marker; nothing to do");
        }
        SyncOutcome::Completed(report) => {
            println!("Synchronization complete");
            println!("  Series processed: {}", report.series_processed);
            println!("  Rows created:     {}", report.rows_created);
            println!("  Rows pruned:      {}", report.rows_pruned);
        }
    }

    Ok(())
}

fn default_lock_path(ledger: &Path) -> PathBuf {
    let mut name = ledger
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger".into());
    name.push(".lock");
    ledger.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_is_a_sibling_of_the_ledger() {
        assert_eq!(
            default_lock_path(Path::new("/data/ledger.cbor")),
            PathBuf::from("/data/ledger.cbor.lock")
        );
    }
}
