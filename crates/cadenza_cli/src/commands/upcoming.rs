//! Upcoming command implementation.

use cadenza_store::{FileSnapshot, Ledger, OccurrenceStatus};
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use std::path::Path;

/// One row of the upcoming listing.
#[derive(Debug, Serialize)]
pub struct UpcomingRow {
    /// Due date.
    pub date: NaiveDate,
    /// Series name at materialization time.
    pub name: String,
    /// Provider at materialization time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Amount in cents.
    pub amount_cents: i64,
}

/// Runs the upcoming command.
pub fn run(path: &Path, days: u32, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Ledger::open(Box::new(FileSnapshot::new(path)))?;

    let today = Utc::now().date_naive();
    let end = today
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or("Horizon is out of calendar range")?;

    let rows: Vec<UpcomingRow> = ledger
        .occurrences_between(today, end)
        .into_iter()
        .filter(|occ| occ.status == OccurrenceStatus::Pending)
        .map(|occ| UpcomingRow {
            date: occ.expense_date,
            name: occ.snapshot.name,
            provider: occ.snapshot.provider,
            amount_cents: occ.snapshot.amount_cents,
        })
        .collect();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            print_text_output(&rows, today, end);
        }
    }

    Ok(())
}

fn print_text_output(rows: &[UpcomingRow], start: NaiveDate, end: NaiveDate) {
    println!("Upcoming occurrences ({start} to {end})");
    println!("=======================================");
    if rows.is_empty() {
        println!("(none)");
        return;
    }
    let mut total = 0_i64;
    for row in rows {
        let provider = row.provider.as_deref().unwrap_or("-");
        println!(
            "  {}  {:<30} {:<20} {:>12}",
            row.date,
            row.name,
            provider,
            format_cents(row.amount_cents)
        );
        total += row.amount_cents;
    }
    println!();
    println!("  Total: {}", format_cents(total));
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}
