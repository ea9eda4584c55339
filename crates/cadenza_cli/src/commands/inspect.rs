//! Inspect command implementation.

use cadenza_store::{FileSnapshot, Ledger};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

/// Ledger inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Ledger path.
    pub path: String,
    /// Number of series.
    pub series_count: usize,
    /// Number of active series.
    pub active_series: usize,
    /// Number of occurrences.
    pub occurrence_count: usize,
    /// Number of pending occurrences.
    pub pending_count: usize,
    /// Pending occurrences due strictly after today.
    pub future_pending: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No ledger found at {path:?}").into());
    }
    let ledger = Ledger::open(Box::new(FileSnapshot::new(path)))?;
    let today = Utc::now().date_naive();

    let series = ledger.list_series();
    let occurrences = ledger.occurrences_between(chrono::NaiveDate::MIN, chrono::NaiveDate::MAX);
    let result = InspectResult {
        path: path.display().to_string(),
        series_count: series.len(),
        active_series: series.iter().filter(|s| s.status.is_active()).count(),
        occurrence_count: occurrences.len(),
        pending_count: occurrences.iter().filter(|o| o.status.is_pending()).count(),
        future_pending: occurrences
            .iter()
            .filter(|o| o.status.is_pending() && o.expense_date > today)
            .count(),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Cadenza Ledger Inspection");
    println!("=========================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Series:");
    println!("  Total:  {}", result.series_count);
    println!("  Active: {}", result.active_series);
    println!();
    println!("Occurrences:");
    println!("  Total:          {}", result.occurrence_count);
    println!("  Pending:        {}", result.pending_count);
    println!("  Future pending: {}", result.future_pending);
}
