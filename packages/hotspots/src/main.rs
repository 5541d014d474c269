#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CLI tool for generating crash hotspots.
//!
//! Clusters the stored crash records with k-means and replaces the
//! persisted hotspot collection. Intended to run as an offline batch job
//! after each data import.

use std::path::PathBuf;

use clap::Parser;
use crash_map_hotspots::{GenerateOptions, generate_hotspots};

#[derive(Parser)]
#[command(name = "crash_map_hotspots", about = "Hotspot generation tool")]
struct Cli {
    /// Number of hotspots to generate (K)
    #[arg(long, default_value_t = 50)]
    clusters: usize,

    /// Minimum crashes per hotspot; smaller clusters are dropped
    #[arg(long, default_value_t = 5)]
    min_crashes: usize,

    /// Independent k-means restarts; the lowest-inertia result wins
    #[arg(long, default_value_t = 10)]
    restarts: usize,

    /// Clustering initialization seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Path to the crash DuckDB file (defaults to data/crash_map.duckdb)
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let conn = match &cli.db {
        Some(path) => crash_map_database::open(path)?,
        None => crash_map_database::open_default()?,
    };

    let options = GenerateOptions {
        clusters: cli.clusters,
        min_crashes: cli.min_crashes,
        restarts: cli.restarts,
        seed: cli.seed,
    };

    let summary = generate_hotspots(&conn, &options)?;

    log::info!(
        "Done: {} hotspots from {} crashes",
        summary.hotspots_created,
        summary.points_clustered
    );

    Ok(())
}
