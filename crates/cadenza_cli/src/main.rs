//! Cadenza CLI
//!
//! Command-line tools for ledger maintenance.
//!
//! # Commands
//!
//! - `sync` - Backfill history, enforce the single future row, advance anchors
//! - `populate-descriptors` - Rewrite stale cached recurrence descriptors
//! - `upcoming` - List occurrences due in the coming days
//! - `inspect` - Display ledger statistics

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cadenza command-line ledger tools.
#[derive(Parser)]
#[command(name = "cadenza")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the ledger snapshot file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize every active series with its materialized occurrences
    Sync {
        /// Run marker file (defaults to a ".lock" sibling of the ledger)
        #[arg(short, long)]
        lock: Option<PathBuf>,
    },

    /// Rewrite stale cached recurrence descriptors
    PopulateDescriptors {
        /// Dry run - count stale series without writing
        #[arg(short, long)]
        dry_run: bool,
    },

    /// List occurrences due in the coming days
    Upcoming {
        /// Horizon in days
        #[arg(short, long, default_value = "30")]
        days: u32,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Display ledger statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Sync { lock } => {
            let path = cli.path.ok_or("Ledger path required for sync")?;
            commands::sync::run(&path, lock.as_deref())?;
        }
        Commands::PopulateDescriptors { dry_run } => {
            let path = cli.path.ok_or("Ledger path required for populate-descriptors")?;
            commands::populate::run(&path, dry_run)?;
        }
        Commands::Upcoming { days, format } => {
            let path = cli.path.ok_or("Ledger path required for upcoming")?;
            commands::upcoming::run(&path, days, &format)?;
        }
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Ledger path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Version => {
            println!("Cadenza CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
