//! Crash record storage and queries.
//!
//! The `crashes` table is the point store: collision records keyed by
//! `collision_id`, upserted in bulk from CSV imports or the synthetic
//! seeder. The clustering pipeline reads a coordinate snapshot; radius
//! search filters an axis-aligned window computed by
//! [`RadiusQuery::bounds`].

use std::collections::BTreeMap;

use crash_map_crash_models::{CrashPoint, CrashRecord, RadiusQuery};
use crash_map_database_models::{BoroughStats, CrashStats};
use duckdb::Connection;

use crate::DbError;

/// Number of rows per INSERT chunk (`DuckDB` handles large batches well).
const CHUNK_SIZE: usize = 5_000;

/// Column list shared by every `SELECT` that reads full crash records.
/// `crash_date` goes through a `::TEXT` cast so it round-trips via
/// [`crate::parse_timestamp`].
const SELECT_COLUMNS: &str = "collision_id, crash_date::TEXT, crash_time, \
     latitude, longitude, borough, zip_code, \
     on_street_name, cross_street_name, off_street_name, \
     persons_injured, persons_killed, \
     pedestrians_injured, pedestrians_killed, \
     cyclists_injured, cyclists_killed, \
     motorists_injured, motorists_killed, \
     contributing_factor_1, contributing_factor_2, \
     vehicle_type_1, vehicle_type_2";

/// Inserts a batch of crash records, upserting on `collision_id`.
///
/// Returns the number of rows affected.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
#[allow(clippy::too_many_lines)]
pub fn insert_crashes(conn: &Connection, records: &[CrashRecord]) -> Result<u64, DbError> {
    if records.is_empty() {
        return Ok(0);
    }

    // Deduplicate within the batch: keep last occurrence of each
    // collision_id (multi-row upserts reject duplicate conflict keys).
    let mut last_seen: BTreeMap<i64, usize> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        last_seen.insert(record.collision_id, i);
    }
    let deduped: Vec<&CrashRecord> = records
        .iter()
        .enumerate()
        .filter(|(i, record)| last_seen.get(&record.collision_id) == Some(i))
        .map(|(_, record)| record)
        .collect();

    if deduped.len() < records.len() {
        log::info!(
            "Deduplicated INSERT batch: {} -> {} rows ({} duplicates removed)",
            records.len(),
            deduped.len(),
            records.len() - deduped.len(),
        );
    }

    let mut total_inserted = 0u64;

    for chunk in deduped.chunks(CHUNK_SIZE) {
        let mut sql = String::from(
            "INSERT INTO crashes (
                collision_id, crash_date, crash_time,
                latitude, longitude, borough, zip_code,
                on_street_name, cross_street_name, off_street_name,
                persons_injured, persons_killed,
                pedestrians_injured, pedestrians_killed,
                cyclists_injured, cyclists_killed,
                motorists_injured, motorists_killed,
                contributing_factor_1, contributing_factor_2,
                vehicle_type_1, vehicle_type_2
            ) VALUES ",
        );

        for (i, _) in chunk.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str("(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)");
        }

        sql.push_str(
            " ON CONFLICT (collision_id) DO UPDATE SET
                crash_date = EXCLUDED.crash_date,
                crash_time = EXCLUDED.crash_time,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                borough = EXCLUDED.borough,
                zip_code = EXCLUDED.zip_code,
                on_street_name = EXCLUDED.on_street_name,
                cross_street_name = EXCLUDED.cross_street_name,
                off_street_name = EXCLUDED.off_street_name,
                persons_injured = EXCLUDED.persons_injured,
                persons_killed = EXCLUDED.persons_killed,
                pedestrians_injured = EXCLUDED.pedestrians_injured,
                pedestrians_killed = EXCLUDED.pedestrians_killed,
                cyclists_injured = EXCLUDED.cyclists_injured,
                cyclists_killed = EXCLUDED.cyclists_killed,
                motorists_injured = EXCLUDED.motorists_injured,
                motorists_killed = EXCLUDED.motorists_killed,
                contributing_factor_1 = EXCLUDED.contributing_factor_1,
                contributing_factor_2 = EXCLUDED.contributing_factor_2,
                vehicle_type_1 = EXCLUDED.vehicle_type_1,
                vehicle_type_2 = EXCLUDED.vehicle_type_2",
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut param_idx = 1usize;

        for record in chunk {
            stmt.raw_bind_parameter(param_idx, record.collision_id)?;
            stmt.raw_bind_parameter(
                param_idx + 1,
                record.crash_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            )?;
            stmt.raw_bind_parameter(param_idx + 2, &record.crash_time)?;
            stmt.raw_bind_parameter(param_idx + 3, record.latitude)?;
            stmt.raw_bind_parameter(param_idx + 4, record.longitude)?;
            stmt.raw_bind_parameter(param_idx + 5, &record.borough)?;
            stmt.raw_bind_parameter(param_idx + 6, &record.zip_code)?;
            stmt.raw_bind_parameter(param_idx + 7, &record.on_street_name)?;
            stmt.raw_bind_parameter(param_idx + 8, &record.cross_street_name)?;
            stmt.raw_bind_parameter(param_idx + 9, &record.off_street_name)?;
            stmt.raw_bind_parameter(param_idx + 10, record.persons_injured)?;
            stmt.raw_bind_parameter(param_idx + 11, record.persons_killed)?;
            stmt.raw_bind_parameter(param_idx + 12, record.pedestrians_injured)?;
            stmt.raw_bind_parameter(param_idx + 13, record.pedestrians_killed)?;
            stmt.raw_bind_parameter(param_idx + 14, record.cyclists_injured)?;
            stmt.raw_bind_parameter(param_idx + 15, record.cyclists_killed)?;
            stmt.raw_bind_parameter(param_idx + 16, record.motorists_injured)?;
            stmt.raw_bind_parameter(param_idx + 17, record.motorists_killed)?;
            stmt.raw_bind_parameter(param_idx + 18, &record.contributing_factor_1)?;
            stmt.raw_bind_parameter(param_idx + 19, &record.contributing_factor_2)?;
            stmt.raw_bind_parameter(param_idx + 20, &record.vehicle_type_1)?;
            stmt.raw_bind_parameter(param_idx + 21, &record.vehicle_type_2)?;

            param_idx += 22;
        }

        let rows = stmt.raw_execute()?;
        total_inserted += u64::try_from(rows).unwrap_or(0);
    }

    Ok(total_inserted)
}

/// Returns the number of crash records stored.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_record_count(conn: &Connection) -> Result<u64, DbError> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM crashes")?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    #[allow(clippy::cast_sign_loss)]
    Ok(count as u64)
}

/// Deletes every crash record.
///
/// # Errors
///
/// Returns [`DbError`] if the delete fails.
pub fn clear_crashes(conn: &Connection) -> Result<u64, DbError> {
    let rows = conn.execute("DELETE FROM crashes", [])?;
    Ok(u64::try_from(rows).unwrap_or(0))
}

/// Retrieves a single crash by collision ID, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_crash(conn: &Connection, collision_id: i64) -> Result<Option<CrashRecord>, DbError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM crashes WHERE collision_id = ?");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(duckdb::params![collision_id], record_from_row);
    match result {
        Ok(record) => Ok(Some(record)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::DuckDb(e)),
    }
}

/// Lists crash records ordered by descending crash date.
///
/// If `limit` is `Some`, returns at most that many rows.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn list_crashes(conn: &Connection, limit: Option<u64>) -> Result<Vec<CrashRecord>, DbError> {
    let sql = limit.map_or_else(
        || format!("SELECT {SELECT_COLUMNS} FROM crashes ORDER BY crash_date DESC"),
        |n| format!("SELECT {SELECT_COLUMNS} FROM crashes ORDER BY crash_date DESC LIMIT {n}"),
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], record_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DbError::DuckDb)
}

/// Reads the clustering snapshot: every crash with known coordinates, as
/// fixed-field [`CrashPoint`]s.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn load_crash_points(conn: &Connection) -> Result<Vec<CrashPoint>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT collision_id, latitude, longitude, persons_injured, persons_killed
         FROM crashes
         WHERE latitude IS NOT NULL AND longitude IS NOT NULL",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(CrashPoint {
            id: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            injured: row.get(3)?,
            killed: row.get(4)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(DbError::DuckDb)
}

/// Returns every crash inside the bounding-box window of a radius query.
///
/// The window approximates a circle (see [`RadiusQuery::bounds`]); no
/// exact geodesic post-filter is applied. An empty result is valid.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn search_in_radius(
    conn: &Connection,
    query: &RadiusQuery,
) -> Result<Vec<CrashRecord>, DbError> {
    let bounds = query.bounds();

    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM crashes
         WHERE latitude IS NOT NULL AND longitude IS NOT NULL
           AND latitude >= ? AND latitude <= ?
           AND longitude >= ? AND longitude <= ?"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map(
        duckdb::params![
            bounds.lat_min,
            bounds.lat_max,
            bounds.lon_min,
            bounds.lon_max,
        ],
        record_from_row,
    )?;

    rows.collect::<Result<Vec<_>, _>>().map_err(DbError::DuckDb)
}

/// Computes aggregate crash statistics with a per-borough breakdown.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_stats(conn: &Connection) -> Result<CrashStats, DbError> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*),
                CAST(COALESCE(SUM(persons_injured), 0) AS BIGINT),
                CAST(COALESCE(SUM(persons_killed), 0) AS BIGINT)
         FROM crashes",
    )?;
    let (total_crashes, total_injured, total_killed) =
        stmt.query_row([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;

    let mut stmt = conn.prepare(
        "SELECT borough,
                COUNT(*),
                CAST(COALESCE(SUM(persons_injured), 0) AS BIGINT),
                CAST(COALESCE(SUM(persons_killed), 0) AS BIGINT)
         FROM crashes
         GROUP BY borough
         ORDER BY COUNT(*) DESC, borough",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(BoroughStats {
            borough: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            crash_count: row.get(1)?,
            injured_count: row.get(2)?,
            killed_count: row.get(3)?,
        })
    })?;
    let borough_breakdown = rows.collect::<Result<Vec<_>, _>>()?;

    Ok(CrashStats {
        total_crashes,
        total_injured,
        total_killed,
        borough_breakdown,
    })
}

/// Maps one row of [`SELECT_COLUMNS`] to a [`CrashRecord`].
fn record_from_row(row: &duckdb::Row<'_>) -> Result<CrashRecord, duckdb::Error> {
    let crash_date_text: String = row.get(1)?;
    let crash_date = crate::parse_timestamp(&crash_date_text).unwrap_or_default();

    Ok(CrashRecord {
        collision_id: row.get(0)?,
        crash_date,
        crash_time: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        borough: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        zip_code: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        on_street_name: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        cross_street_name: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        off_street_name: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        persons_injured: row.get(10)?,
        persons_killed: row.get(11)?,
        pedestrians_injured: row.get(12)?,
        pedestrians_killed: row.get(13)?,
        cyclists_injured: row.get(14)?,
        cyclists_killed: row.get(15)?,
        motorists_injured: row.get(16)?,
        motorists_killed: row.get(17)?,
        contributing_factor_1: row.get::<_, Option<String>>(18)?.unwrap_or_default(),
        contributing_factor_2: row.get::<_, Option<String>>(19)?.unwrap_or_default(),
        vehicle_type_1: row.get::<_, Option<String>>(20)?.unwrap_or_default(),
        vehicle_type_2: row.get::<_, Option<String>>(21)?.unwrap_or_default(),
    })
}
