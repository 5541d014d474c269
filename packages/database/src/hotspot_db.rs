//! Hotspot storage and queries.
//!
//! The `hotspots` table holds exactly one generation's output. Each
//! regeneration run swaps the whole collection inside a single
//! transaction (delete + insert), so a failure mid-run leaves the
//! previous generation untouched and readers never see a partial mix.

use std::fmt::Write as _;

use crash_map_database_models::{HotspotQuery, HotspotRow, NewHotspot};
use duckdb::Connection;

use crate::DbError;

/// Column list shared by every `SELECT` that reads hotspot rows.
const SELECT_COLUMNS: &str = "id, name, latitude, longitude, radius_meters, \
     crash_count, total_injured, total_killed, severity_index, \
     created_at::TEXT";

/// Atomically replaces the hotspot collection with a new generation.
///
/// Deletes all existing rows and inserts the new set inside one
/// transaction. An empty `hotspots` slice is valid and empties the
/// collection. Row IDs are assigned densely from 1 in slice order; every
/// row in the generation shares one `created_at` timestamp.
///
/// Returns the number of hotspots inserted.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails; the transaction is rolled
/// back and the previous generation remains in place.
pub fn replace_hotspots(conn: &Connection, hotspots: &[NewHotspot]) -> Result<u64, DbError> {
    conn.execute_batch("BEGIN TRANSACTION")?;

    match insert_generation(conn, hotspots) {
        Ok(count) => {
            conn.execute_batch("COMMIT")?;
            Ok(count)
        }
        Err(e) => {
            if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                log::warn!("Failed to roll back hotspot replace: {rollback_err}");
            }
            Err(e)
        }
    }
}

fn insert_generation(conn: &Connection, hotspots: &[NewHotspot]) -> Result<u64, DbError> {
    conn.execute("DELETE FROM hotspots", [])?;

    let created_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let mut stmt = conn.prepare(
        "INSERT INTO hotspots (
            id, name, latitude, longitude, radius_meters,
            crash_count, total_injured, total_killed, severity_index,
            created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )?;

    for (id, hotspot) in (1i64..).zip(hotspots) {
        stmt.execute(duckdb::params![
            id,
            hotspot.name,
            hotspot.latitude,
            hotspot.longitude,
            hotspot.radius_meters,
            hotspot.crash_count,
            hotspot.total_injured,
            hotspot.total_killed,
            hotspot.severity_index,
            created_at,
        ])?;
    }

    Ok(hotspots.len() as u64)
}

/// Lists hotspots matching the query, ordered by descending severity
/// index.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn list_hotspots(conn: &Connection, query: &HotspotQuery) -> Result<Vec<HotspotRow>, DbError> {
    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM hotspots WHERE 1=1");
    let mut params: Vec<i64> = Vec::new();

    if let Some(min_crashes) = query.min_crashes {
        sql.push_str(" AND crash_count >= ?");
        params.push(min_crashes);
    }

    if let Some(min_severity) = query.min_severity {
        sql.push_str(" AND severity_index >= ?");
        params.push(min_severity);
    }

    sql.push_str(" ORDER BY severity_index DESC");

    if let Some(limit) = query.limit {
        write!(sql, " LIMIT {limit}").unwrap();
    }

    let mut stmt = conn.prepare(&sql)?;

    for (i, param) in params.iter().enumerate() {
        stmt.raw_bind_parameter(i + 1, *param)?;
    }

    stmt.raw_execute()?;

    let mut hotspots = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        hotspots.push(row_to_hotspot(row)?);
    }

    Ok(hotspots)
}

/// Returns the top `limit` hotspots by severity index.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn top_by_severity(conn: &Connection, limit: u32) -> Result<Vec<HotspotRow>, DbError> {
    list_hotspots(
        conn,
        &HotspotQuery {
            limit: Some(limit),
            ..HotspotQuery::default()
        },
    )
}

/// Retrieves a single hotspot by ID, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_hotspot(conn: &Connection, id: i64) -> Result<Option<HotspotRow>, DbError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM hotspots WHERE id = ?");
    let mut stmt = conn.prepare(&sql)?;

    stmt.raw_bind_parameter(1, id)?;
    stmt.raw_execute()?;

    let mut rows = stmt.raw_query();
    match rows.next()? {
        Some(row) => Ok(Some(row_to_hotspot(row)?)),
        None => Ok(None),
    }
}

fn row_to_hotspot(row: &duckdb::Row<'_>) -> Result<HotspotRow, duckdb::Error> {
    let created_at_text: String = row.get(9)?;
    let created_at = crate::parse_timestamp(&created_at_text).unwrap_or_default();

    Ok(HotspotRow {
        id: row.get(0)?,
        name: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        radius_meters: row.get(4)?,
        crash_count: row.get(5)?,
        total_injured: row.get(6)?,
        total_killed: row.get(7)?,
        severity_index: row.get(8)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::create_schema(&conn).unwrap();
        conn
    }

    fn hotspot(name: &str, crash_count: i64, killed: i64) -> NewHotspot {
        NewHotspot {
            name: name.to_string(),
            latitude: 40.7589,
            longitude: -73.9851,
            radius_meters: 250.0,
            crash_count,
            total_injured: crash_count,
            total_killed: killed,
            severity_index: crash_count + crash_count + killed * 10,
        }
    }

    #[test]
    fn replace_assigns_ids_and_timestamps() {
        let conn = test_conn();
        let inserted =
            replace_hotspots(&conn, &[hotspot("Hotspot 1", 10, 0), hotspot("Hotspot 3", 7, 1)])
                .unwrap();
        assert_eq!(inserted, 2);

        let rows = list_hotspots(&conn, &HotspotQuery::default()).unwrap();
        assert_eq!(rows.len(), 2);

        let by_name: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert!(by_name.contains(&"Hotspot 1"));
        assert!(by_name.contains(&"Hotspot 3"));
        assert!(rows.iter().all(|r| r.id >= 1));
        assert_eq!(rows[0].created_at, rows[1].created_at);
    }

    #[test]
    fn regeneration_fully_supersedes_previous_run() {
        let conn = test_conn();
        replace_hotspots(&conn, &[hotspot("Hotspot 1", 10, 0)]).unwrap();
        replace_hotspots(&conn, &[hotspot("Hotspot 2", 4, 0), hotspot("Hotspot 5", 8, 2)])
            .unwrap();

        let rows = list_hotspots(&conn, &HotspotQuery::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.name != "Hotspot 1"));
    }

    #[test]
    fn empty_generation_empties_the_collection() {
        let conn = test_conn();
        replace_hotspots(&conn, &[hotspot("Hotspot 1", 10, 0)]).unwrap();
        assert_eq!(replace_hotspots(&conn, &[]).unwrap(), 0);
        assert!(list_hotspots(&conn, &HotspotQuery::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn list_orders_by_severity_and_applies_filters() {
        let conn = test_conn();
        replace_hotspots(
            &conn,
            &[
                hotspot("Hotspot 1", 5, 0),  // severity 10
                hotspot("Hotspot 2", 20, 1), // severity 50
                hotspot("Hotspot 3", 10, 0), // severity 20
            ],
        )
        .unwrap();

        let all = list_hotspots(&conn, &HotspotQuery::default()).unwrap();
        let severities: Vec<i64> = all.iter().map(|r| r.severity_index).collect();
        assert_eq!(severities, vec![50, 20, 10]);

        let filtered = list_hotspots(
            &conn,
            &HotspotQuery {
                min_crashes: Some(10),
                ..HotspotQuery::default()
            },
        )
        .unwrap();
        assert_eq!(filtered.len(), 2);

        let severe = list_hotspots(
            &conn,
            &HotspotQuery {
                min_severity: Some(20),
                ..HotspotQuery::default()
            },
        )
        .unwrap();
        assert_eq!(severe.len(), 2);

        let top = top_by_severity(&conn, 1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].severity_index, 50);
    }

    #[test]
    fn get_hotspot_by_id() {
        let conn = test_conn();
        replace_hotspots(&conn, &[hotspot("Hotspot 1", 10, 0)]).unwrap();

        let row = get_hotspot(&conn, 1).unwrap().unwrap();
        assert_eq!(row.name, "Hotspot 1");
        assert!(get_hotspot(&conn, 42).unwrap().is_none());
    }
}
