#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database row types and query parameter definitions.
//!
//! These types represent the shapes of data as stored in and retrieved
//! from the crash `DuckDB` database. They are distinct from the API
//! response types in `crash_map_server_models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hotspot about to be inserted; the database assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHotspot {
    /// Generated name ("Hotspot {n}").
    pub name: String,
    /// Cluster center latitude (mean of member latitudes).
    pub latitude: f64,
    /// Cluster center longitude (mean of member longitudes).
    pub longitude: f64,
    /// Distance from center to the farthest member, in meters.
    pub radius_meters: f64,
    /// Number of member crashes.
    pub crash_count: i64,
    /// Sum of persons injured over member crashes.
    pub total_injured: i64,
    /// Sum of persons killed over member crashes.
    pub total_killed: i64,
    /// `crash_count + total_injured + 10 * total_killed`.
    pub severity_index: i64,
}

/// A hotspot row as retrieved from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRow {
    /// Primary key.
    pub id: i64,
    /// Generated name ("Hotspot {n}").
    pub name: String,
    /// Cluster center latitude.
    pub latitude: f64,
    /// Cluster center longitude.
    pub longitude: f64,
    /// Distance from center to the farthest member, in meters.
    pub radius_meters: f64,
    /// Number of member crashes.
    pub crash_count: i64,
    /// Sum of persons injured over member crashes.
    pub total_injured: i64,
    /// Sum of persons killed over member crashes.
    pub total_killed: i64,
    /// `crash_count + total_injured + 10 * total_killed`.
    pub severity_index: i64,
    /// When this generation run produced the hotspot.
    pub created_at: DateTime<Utc>,
}

/// Filters for listing hotspots. Results are always ordered by
/// descending severity index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotQuery {
    /// Keep only hotspots with at least this many crashes.
    pub min_crashes: Option<i64>,
    /// Keep only hotspots with at least this severity index.
    pub min_severity: Option<i64>,
    /// Maximum number of rows to return.
    pub limit: Option<u32>,
}

/// Aggregate crash statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashStats {
    /// Total crash records.
    pub total_crashes: i64,
    /// Total persons injured.
    pub total_injured: i64,
    /// Total persons killed.
    pub total_killed: i64,
    /// Per-borough counts, ordered by descending crash count.
    pub borough_breakdown: Vec<BoroughStats>,
}

/// Crash statistics for one borough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoroughStats {
    /// Borough name as stored (empty when the source omitted it).
    pub borough: String,
    /// Crash records in this borough.
    pub crash_count: i64,
    /// Persons injured in this borough.
    pub injured_count: i64,
    /// Persons killed in this borough.
    pub killed_count: i64,
}
