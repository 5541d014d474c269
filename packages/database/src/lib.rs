#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `DuckDB` storage for the crash map.
//!
//! A single database file holds the `crashes` table (the point store) and
//! the `hotspots` table (the derived output). Hotspot regeneration
//! replaces the whole `hotspots` table inside one transaction so readers
//! never observe a mix of two generations.

pub mod crash_db;
pub mod hotspot_db;
pub mod paths;

use std::path::Path;

use duckdb::Connection;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("Database error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Filesystem error creating the data directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens (or creates) the crash `DuckDB` database and ensures the schema
/// exists.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Opens the crash database at the default path.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_default() -> Result<Connection, DbError> {
    open(&paths::crash_db_path())
}

/// Opens a read-only connection for query serving.
///
/// The file must already exist; no schema creation is attempted.
///
/// # Errors
///
/// Returns [`DbError`] if the connection fails.
pub fn open_read_only(path: &Path) -> Result<Connection, DbError> {
    let config = duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?;
    Ok(Connection::open_with_flags(path, config)?)
}

/// Creates the `crashes` and `hotspots` tables if they do not exist.
///
/// [`open`] calls this automatically; it is exposed for callers that
/// manage their own connections (e.g. in-memory test databases).
///
/// # Errors
///
/// Returns [`DbError`] if table creation fails.
pub fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS crashes (
            collision_id BIGINT NOT NULL PRIMARY KEY,
            crash_date TIMESTAMP NOT NULL,
            crash_time TEXT,
            latitude DOUBLE,
            longitude DOUBLE,
            borough TEXT,
            zip_code TEXT,
            on_street_name TEXT,
            cross_street_name TEXT,
            off_street_name TEXT,
            persons_injured INTEGER NOT NULL DEFAULT 0,
            persons_killed INTEGER NOT NULL DEFAULT 0,
            pedestrians_injured INTEGER NOT NULL DEFAULT 0,
            pedestrians_killed INTEGER NOT NULL DEFAULT 0,
            cyclists_injured INTEGER NOT NULL DEFAULT 0,
            cyclists_killed INTEGER NOT NULL DEFAULT 0,
            motorists_injured INTEGER NOT NULL DEFAULT 0,
            motorists_killed INTEGER NOT NULL DEFAULT 0,
            contributing_factor_1 TEXT,
            contributing_factor_2 TEXT,
            vehicle_type_1 TEXT,
            vehicle_type_2 TEXT
        );

        CREATE TABLE IF NOT EXISTS hotspots (
            id BIGINT NOT NULL PRIMARY KEY,
            name TEXT NOT NULL,
            latitude DOUBLE NOT NULL,
            longitude DOUBLE NOT NULL,
            radius_meters DOUBLE NOT NULL,
            crash_count BIGINT NOT NULL,
            total_injured BIGINT NOT NULL,
            total_killed BIGINT NOT NULL,
            severity_index BIGINT NOT NULL,
            created_at TIMESTAMP NOT NULL
        );",
    )?;

    Ok(())
}

/// Parses a `DuckDB` timestamp text representation into a UTC `DateTime`.
///
/// `DuckDB`'s `::TEXT` cast can produce several formats depending on the
/// stored precision (with/without fractional seconds, with/without
/// timezone). Tries them in order and returns the first successful parse.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::{DateTime, NaiveDateTime, Utc};

    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
    }

    log::warn!("Failed to parse timestamp: {s:?}");
    None
}
