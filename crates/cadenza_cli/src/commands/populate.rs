//! Populate-descriptors command implementation.

use cadenza_store::{FileSnapshot, Ledger};
use cadenza_sync::maintenance;
use std::path::Path;

/// Runs the populate-descriptors command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Ledger::open(Box::new(FileSnapshot::new(path)))?;

    let count = maintenance::populate_descriptors(&ledger, dry_run)?;
    if dry_run {
        println!("{count} series have stale descriptors (dry run, nothing written)");
    } else {
        println!("Rewrote descriptors for {count} series");
    }

    Ok(())
}
