#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crash map server.
//!
//! These types are serialized to JSON for the REST API. They are
//! separate from the database row types to allow independent evolution
//! of the API contract.

use chrono::{DateTime, Utc};
use crash_map_crash_models::CrashRecord;
use crash_map_database_models::{BoroughStats, CrashStats, HotspotRow};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// A hotspot as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHotspot {
    /// Unique hotspot ID.
    pub id: i64,
    /// Generated name ("Hotspot {n}").
    pub name: String,
    /// Cluster center latitude.
    pub latitude: f64,
    /// Cluster center longitude.
    pub longitude: f64,
    /// Radius in meters.
    pub radius_meters: f64,
    /// Number of member crashes.
    pub crash_count: i64,
    /// Total persons injured.
    pub total_injured: i64,
    /// Total persons killed.
    pub total_killed: i64,
    /// Severity ranking score.
    pub severity_index: i64,
    /// When the generation run produced this hotspot.
    pub created_at: DateTime<Utc>,
}

impl From<HotspotRow> for ApiHotspot {
    fn from(row: HotspotRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            radius_meters: row.radius_meters,
            crash_count: row.crash_count,
            total_injured: row.total_injured,
            total_killed: row.total_killed,
            severity_index: row.severity_index,
            created_at: row.created_at,
        }
    }
}

/// Query parameters for the hotspots listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotQueryParams {
    /// Minimum crash count.
    pub min_crashes: Option<i64>,
    /// Minimum severity index.
    pub min_severity: Option<i64>,
}

/// Query parameters for the top-severity endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSeverityParams {
    /// Maximum number of hotspots to return (default 10).
    pub limit: Option<u32>,
}

/// A crash as returned by listing and search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrash {
    /// Collision ID.
    pub collision_id: i64,
    /// When the crash occurred (ISO 8601).
    pub crash_date: DateTime<Utc>,
    /// Latitude, if geocoded.
    pub latitude: Option<f64>,
    /// Longitude, if geocoded.
    pub longitude: Option<f64>,
    /// Borough name.
    pub borough: String,
    /// Total persons injured.
    pub persons_injured: i32,
    /// Total persons killed.
    pub persons_killed: i32,
    /// Per-record severity score (injuries + 10 x fatalities).
    pub total_severity: i32,
}

impl From<&CrashRecord> for ApiCrash {
    fn from(record: &CrashRecord) -> Self {
        Self {
            collision_id: record.collision_id,
            crash_date: record.crash_date,
            latitude: record.latitude,
            longitude: record.longitude,
            borough: record.borough.clone(),
            persons_injured: record.persons_injured,
            persons_killed: record.persons_killed,
            total_severity: record.total_severity(),
        }
    }
}

/// A detailed crash record as returned by the retrieve endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrashDetail {
    /// Collision ID.
    pub collision_id: i64,
    /// When the crash occurred (ISO 8601).
    pub crash_date: DateTime<Utc>,
    /// Time of day as reported.
    pub crash_time: String,
    /// Latitude, if geocoded.
    pub latitude: Option<f64>,
    /// Longitude, if geocoded.
    pub longitude: Option<f64>,
    /// Borough name.
    pub borough: String,
    /// ZIP code.
    pub zip_code: String,
    /// Street the crash occurred on.
    pub on_street_name: String,
    /// Nearest cross street.
    pub cross_street_name: String,
    /// Off-street location.
    pub off_street_name: String,
    /// Total persons injured.
    pub persons_injured: i32,
    /// Total persons killed.
    pub persons_killed: i32,
    /// Pedestrians injured.
    pub pedestrians_injured: i32,
    /// Pedestrians killed.
    pub pedestrians_killed: i32,
    /// Cyclists injured.
    pub cyclists_injured: i32,
    /// Cyclists killed.
    pub cyclists_killed: i32,
    /// Motorists injured.
    pub motorists_injured: i32,
    /// Motorists killed.
    pub motorists_killed: i32,
    /// Primary contributing factor.
    pub contributing_factor_1: String,
    /// Secondary contributing factor.
    pub contributing_factor_2: String,
    /// Primary vehicle type.
    pub vehicle_type_1: String,
    /// Secondary vehicle type.
    pub vehicle_type_2: String,
    /// Per-record severity score (injuries + 10 x fatalities).
    pub total_severity: i32,
}

impl From<CrashRecord> for ApiCrashDetail {
    fn from(record: CrashRecord) -> Self {
        let total_severity = record.total_severity();
        Self {
            collision_id: record.collision_id,
            crash_date: record.crash_date,
            crash_time: record.crash_time,
            latitude: record.latitude,
            longitude: record.longitude,
            borough: record.borough,
            zip_code: record.zip_code,
            on_street_name: record.on_street_name,
            cross_street_name: record.cross_street_name,
            off_street_name: record.off_street_name,
            persons_injured: record.persons_injured,
            persons_killed: record.persons_killed,
            pedestrians_injured: record.pedestrians_injured,
            pedestrians_killed: record.pedestrians_killed,
            cyclists_injured: record.cyclists_injured,
            cyclists_killed: record.cyclists_killed,
            motorists_injured: record.motorists_injured,
            motorists_killed: record.motorists_killed,
            contributing_factor_1: record.contributing_factor_1,
            contributing_factor_2: record.contributing_factor_2,
            vehicle_type_1: record.vehicle_type_1,
            vehicle_type_2: record.vehicle_type_2,
            total_severity,
        }
    }
}

/// Query parameters for the crash listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashListParams {
    /// Maximum number of crashes to return.
    pub limit: Option<u64>,
}

/// Raw query parameters for the radius search endpoint.
///
/// Kept as strings so validation (and its 400 response) stays in our
/// hands instead of serde's.
#[derive(Debug, Clone, Deserialize)]
pub struct RadiusSearchParams {
    /// Search center latitude.
    pub lat: Option<String>,
    /// Search center longitude.
    pub lon: Option<String>,
    /// Search radius in meters (default 1000).
    pub radius: Option<String>,
}

/// Response from the radius search endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusSearchResponse {
    /// Number of matching crashes.
    pub count: usize,
    /// The matching crashes.
    pub results: Vec<ApiCrash>,
}

/// Aggregate statistics response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStats {
    /// Total crash records.
    pub total_crashes: i64,
    /// Total persons injured.
    pub total_injured: i64,
    /// Total persons killed.
    pub total_killed: i64,
    /// Per-borough counts, ordered by descending crash count.
    pub borough_breakdown: Vec<ApiBoroughStats>,
}

/// Per-borough statistics entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBoroughStats {
    /// Borough name.
    pub borough: String,
    /// Crash records in this borough.
    pub crash_count: i64,
    /// Persons injured in this borough.
    pub injured_count: i64,
    /// Persons killed in this borough.
    pub killed_count: i64,
}

impl From<BoroughStats> for ApiBoroughStats {
    fn from(stats: BoroughStats) -> Self {
        Self {
            borough: stats.borough,
            crash_count: stats.crash_count,
            injured_count: stats.injured_count,
            killed_count: stats.killed_count,
        }
    }
}

impl From<CrashStats> for ApiStats {
    fn from(stats: CrashStats) -> Self {
        Self {
            total_crashes: stats.total_crashes,
            total_injured: stats.total_injured,
            total_killed: stats.total_killed,
            borough_breakdown: stats
                .borough_breakdown
                .into_iter()
                .map(ApiBoroughStats::from)
                .collect(),
        }
    }
}
