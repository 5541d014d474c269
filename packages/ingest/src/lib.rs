#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crash data ingestion.
//!
//! Two ways to get collision records into the crash database: importing
//! an NYC Open Data collision CSV export ([`csv_import`]) and generating
//! deterministic synthetic records for development ([`seed`]).
//!
//! Fetching from the live Socrata API (with its paging and rate limits)
//! is deliberately not part of this tool; exports are imported as files.

pub mod csv_import;
pub mod seed;

use crash_map_database::DbError;

/// Errors from the ingestion tool.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Database error.
    #[error(transparent)]
    Db(#[from] DbError),

    /// CSV parse error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem error reading the input file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
