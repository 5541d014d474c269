#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CLI entry point for the crash data ingestion tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crash_map_ingest::{csv_import, seed};

#[derive(Parser)]
#[command(name = "crash_map_ingest", about = "Crash data ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an NYC Open Data collision CSV export
    ImportCsv {
        /// Path to the CSV file
        path: PathBuf,
        /// Maximum number of rows to read (for testing)
        #[arg(long)]
        limit: Option<u64>,
        /// Path to the crash DuckDB file (defaults to data/crash_map.duckdb)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Seed the database with deterministic synthetic crash records
    Seed {
        /// Number of records to create
        #[arg(long, default_value_t = 50)]
        count: u32,
        /// Generator seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Clear existing crash records first
        #[arg(long)]
        clear: bool,
        /// Path to the crash DuckDB file (defaults to data/crash_map.duckdb)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn open_db(path: Option<&PathBuf>) -> Result<duckdb::Connection, crash_map_database::DbError> {
    match path {
        Some(path) => crash_map_database::open(path),
        None => crash_map_database::open_default(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::ImportCsv { path, limit, db } => {
            let conn = open_db(db.as_ref())?;
            let summary = csv_import::import_csv(&conn, &path, limit)?;
            log::info!(
                "Imported {} of {} rows ({} skipped)",
                summary.rows_inserted,
                summary.rows_read,
                summary.rows_skipped
            );
        }
        Commands::Seed {
            count,
            seed,
            clear,
            db,
        } => {
            let conn = open_db(db.as_ref())?;
            seed::seed_crashes(&conn, count, seed, clear)?;

            let stats = crash_map_database::crash_db::get_stats(&conn)?;
            log::info!(
                "Totals: {} crashes, {} injured, {} killed",
                stats.total_crashes,
                stats.total_injured,
                stats.total_killed
            );
            for borough in &stats.borough_breakdown {
                log::info!("  {}: {} crashes", borough.borough, borough.crash_count);
            }
        }
    }

    Ok(())
}
