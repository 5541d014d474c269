//! CSV import for NYC Open Data collision exports.
//!
//! Parses the "Motor Vehicle Collisions - Crashes" CSV layout (one row
//! per collision, `COLLISION_ID` unique) and upserts rows into the
//! crashes table. Rows without a parseable collision ID or crash date
//! are skipped with a warning; rows without coordinates are stored with
//! NULL coordinates and simply never reach the clustering snapshot.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crash_map_crash_models::CrashRecord;
use crash_map_database::crash_db;
use duckdb::Connection;
use serde::Deserialize;

use crate::IngestError;

/// Rows accumulated per database insert batch.
const BATCH_SIZE: usize = 5_000;

/// One raw CSV row in the NYC Open Data export layout.
///
/// Everything is optional text; normalization happens in
/// [`CsvCrashRow::into_record`].
#[derive(Debug, Deserialize)]
pub struct CsvCrashRow {
    /// "MM/DD/YYYY".
    #[serde(rename = "CRASH DATE")]
    pub crash_date: Option<String>,
    /// "HH:MM" (24h).
    #[serde(rename = "CRASH TIME")]
    pub crash_time: Option<String>,
    #[serde(rename = "BOROUGH")]
    pub borough: Option<String>,
    #[serde(rename = "ZIP CODE")]
    pub zip_code: Option<String>,
    #[serde(rename = "LATITUDE")]
    pub latitude: Option<String>,
    #[serde(rename = "LONGITUDE")]
    pub longitude: Option<String>,
    #[serde(rename = "ON STREET NAME")]
    pub on_street_name: Option<String>,
    #[serde(rename = "CROSS STREET NAME")]
    pub cross_street_name: Option<String>,
    #[serde(rename = "OFF STREET NAME")]
    pub off_street_name: Option<String>,
    #[serde(rename = "NUMBER OF PERSONS INJURED")]
    pub persons_injured: Option<String>,
    #[serde(rename = "NUMBER OF PERSONS KILLED")]
    pub persons_killed: Option<String>,
    #[serde(rename = "NUMBER OF PEDESTRIANS INJURED")]
    pub pedestrians_injured: Option<String>,
    #[serde(rename = "NUMBER OF PEDESTRIANS KILLED")]
    pub pedestrians_killed: Option<String>,
    #[serde(rename = "NUMBER OF CYCLIST INJURED")]
    pub cyclists_injured: Option<String>,
    #[serde(rename = "NUMBER OF CYCLIST KILLED")]
    pub cyclists_killed: Option<String>,
    #[serde(rename = "NUMBER OF MOTORIST INJURED")]
    pub motorists_injured: Option<String>,
    #[serde(rename = "NUMBER OF MOTORIST KILLED")]
    pub motorists_killed: Option<String>,
    #[serde(rename = "CONTRIBUTING FACTOR VEHICLE 1")]
    pub contributing_factor_1: Option<String>,
    #[serde(rename = "CONTRIBUTING FACTOR VEHICLE 2")]
    pub contributing_factor_2: Option<String>,
    #[serde(rename = "COLLISION_ID")]
    pub collision_id: Option<String>,
    #[serde(rename = "VEHICLE TYPE CODE 1")]
    pub vehicle_type_1: Option<String>,
    #[serde(rename = "VEHICLE TYPE CODE 2")]
    pub vehicle_type_2: Option<String>,
}

impl CsvCrashRow {
    /// Normalizes the raw row into a [`CrashRecord`].
    ///
    /// Returns `None` when the collision ID or crash date is missing or
    /// unparseable — without those the row cannot be keyed or ordered.
    #[must_use]
    pub fn into_record(self) -> Option<CrashRecord> {
        let collision_id: i64 = self.collision_id.as_deref()?.trim().parse().ok()?;
        let crash_date = parse_crash_datetime(
            self.crash_date.as_deref()?,
            self.crash_time.as_deref().unwrap_or_default(),
        )?;

        Some(CrashRecord {
            collision_id,
            crash_date,
            crash_time: self.crash_time.unwrap_or_default(),
            latitude: parse_coordinate(self.latitude.as_deref()),
            longitude: parse_coordinate(self.longitude.as_deref()),
            borough: self.borough.unwrap_or_default(),
            zip_code: self.zip_code.unwrap_or_default(),
            on_street_name: self.on_street_name.unwrap_or_default(),
            cross_street_name: self.cross_street_name.unwrap_or_default(),
            off_street_name: self.off_street_name.unwrap_or_default(),
            persons_injured: parse_count(self.persons_injured.as_deref()),
            persons_killed: parse_count(self.persons_killed.as_deref()),
            pedestrians_injured: parse_count(self.pedestrians_injured.as_deref()),
            pedestrians_killed: parse_count(self.pedestrians_killed.as_deref()),
            cyclists_injured: parse_count(self.cyclists_injured.as_deref()),
            cyclists_killed: parse_count(self.cyclists_killed.as_deref()),
            motorists_injured: parse_count(self.motorists_injured.as_deref()),
            motorists_killed: parse_count(self.motorists_killed.as_deref()),
            contributing_factor_1: self.contributing_factor_1.unwrap_or_default(),
            contributing_factor_2: self.contributing_factor_2.unwrap_or_default(),
            vehicle_type_1: self.vehicle_type_1.unwrap_or_default(),
            vehicle_type_2: self.vehicle_type_2.unwrap_or_default(),
        })
    }
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// CSV rows read.
    pub rows_read: u64,
    /// Records upserted into the database.
    pub rows_inserted: u64,
    /// Rows skipped (missing collision ID or crash date).
    pub rows_skipped: u64,
}

/// Imports a collision CSV export into the crashes table.
///
/// If `limit` is `Some`, stops after reading that many rows.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or a database
/// insert fails. Individual malformed rows are skipped, not fatal.
pub fn import_csv(
    conn: &Connection,
    path: &Path,
    limit: Option<u64>,
) -> Result<ImportSummary, IngestError> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut summary = ImportSummary {
        rows_read: 0,
        rows_inserted: 0,
        rows_skipped: 0,
    };
    let mut batch: Vec<CrashRecord> = Vec::with_capacity(BATCH_SIZE);

    for row in reader.deserialize::<CsvCrashRow>() {
        if let Some(limit) = limit
            && summary.rows_read >= limit
        {
            break;
        }
        summary.rows_read += 1;

        match row {
            Ok(row) => {
                if let Some(record) = row.into_record() {
                    batch.push(record);
                } else {
                    summary.rows_skipped += 1;
                }
            }
            Err(e) => {
                log::warn!("Skipping malformed CSV row: {e}");
                summary.rows_skipped += 1;
            }
        }

        if batch.len() >= BATCH_SIZE {
            summary.rows_inserted += crash_db::insert_crashes(conn, &batch)?;
            batch.clear();
            log::info!("Imported {} rows...", summary.rows_inserted);
        }
    }

    if !batch.is_empty() {
        summary.rows_inserted += crash_db::insert_crashes(conn, &batch)?;
    }

    log::info!(
        "Import complete: {} read, {} inserted, {} skipped",
        summary.rows_read,
        summary.rows_inserted,
        summary.rows_skipped
    );

    Ok(summary)
}

/// Parses `"MM/DD/YYYY"` plus `"HH:MM"` into a UTC timestamp. The time
/// part defaults to midnight when missing or malformed.
#[must_use]
pub fn parse_crash_datetime(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%m/%d/%Y").ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .unwrap_or_else(|_| NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default());
    Some(date.and_time(time).and_utc())
}

/// Parses a latitude/longitude field. Empty, unparseable, and exact-zero
/// values (the export's placeholder for "not geocoded") become `None`.
#[must_use]
pub fn parse_coordinate(value: Option<&str>) -> Option<f64> {
    let parsed: f64 = value?.trim().parse().ok()?;
    if parsed == 0.0 {
        return None;
    }
    Some(parsed)
}

/// Parses an injury/fatality count field; anything missing or
/// unparseable counts as zero.
#[must_use]
pub fn parse_count(value: Option<&str>) -> i32 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "CRASH DATE,CRASH TIME,BOROUGH,ZIP CODE,LATITUDE,LONGITUDE,\
ON STREET NAME,CROSS STREET NAME,OFF STREET NAME,\
NUMBER OF PERSONS INJURED,NUMBER OF PERSONS KILLED,\
NUMBER OF PEDESTRIANS INJURED,NUMBER OF PEDESTRIANS KILLED,\
NUMBER OF CYCLIST INJURED,NUMBER OF CYCLIST KILLED,\
NUMBER OF MOTORIST INJURED,NUMBER OF MOTORIST KILLED,\
CONTRIBUTING FACTOR VEHICLE 1,CONTRIBUTING FACTOR VEHICLE 2,\
COLLISION_ID,VEHICLE TYPE CODE 1,VEHICLE TYPE CODE 2";

    fn parse_one(row: &str) -> Option<CrashRecord> {
        let data = format!("{HEADER}\n{row}");
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let row: CsvCrashRow = reader.deserialize().next().unwrap().unwrap();
        row.into_record()
    }

    #[test]
    fn parses_a_full_row() {
        let record = parse_one(
            "01/15/2024,14:30,MANHATTAN,10019,40.7589,-73.9851,\
BROADWAY,42ND ST,,2,0,1,0,0,0,1,0,\
Driver Inattention/Distraction,,4123456,PASSENGER VEHICLE,",
        )
        .unwrap();

        assert_eq!(record.collision_id, 4_123_456);
        assert_eq!(record.borough, "MANHATTAN");
        assert_eq!(record.latitude, Some(40.7589));
        assert_eq!(record.persons_injured, 2);
        assert_eq!(record.pedestrians_injured, 1);
        assert_eq!(record.crash_date.to_string(), "2024-01-15 14:30:00 UTC");
        assert_eq!(record.total_severity(), 2);
    }

    #[test]
    fn ungeocoded_rows_keep_null_coordinates() {
        let record = parse_one(
            "01/15/2024,14:30,,,,,,,,0,0,0,0,0,0,0,0,,,4123457,,",
        )
        .unwrap();
        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);
        assert!(record.as_point().is_none());
    }

    #[test]
    fn zero_coordinates_are_treated_as_missing() {
        assert_eq!(parse_coordinate(Some("0.0")), None);
        assert_eq!(parse_coordinate(Some("")), None);
        assert_eq!(parse_coordinate(Some("40.75")), Some(40.75));
    }

    #[test]
    fn rows_without_collision_id_or_date_are_rejected() {
        assert!(parse_one("01/15/2024,14:30,,,,,,,,0,0,0,0,0,0,0,0,,,,,").is_none());
        assert!(parse_one("not-a-date,14:30,,,,,,,,0,0,0,0,0,0,0,0,,,4123458,,").is_none());
    }

    #[test]
    fn malformed_time_defaults_to_midnight() {
        let dt = parse_crash_datetime("01/15/2024", "").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 00:00:00 UTC");
    }

    #[test]
    fn count_fields_default_to_zero() {
        assert_eq!(parse_count(None), 0);
        assert_eq!(parse_count(Some("")), 0);
        assert_eq!(parse_count(Some("3")), 3);
    }

    #[test]
    fn import_writes_to_the_database() {
        let conn = Connection::open_in_memory().unwrap();
        crash_map_database::create_schema(&conn).unwrap();

        let data = format!(
            "{HEADER}\n\
01/15/2024,10:00,MANHATTAN,10019,40.7589,-73.9851,BROADWAY,42ND ST,,1,0,0,0,0,0,1,0,,,1,,\n\
01/16/2024,11:00,BROOKLYN,11201,40.6782,-73.9442,FLATBUSH AVE,ATLANTIC AVE,,0,1,0,0,0,0,0,1,,,2,,\n"
        );
        let dir = std::env::temp_dir().join("crash_map_csv_import_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("crashes.csv");
        std::fs::write(&path, data).unwrap();

        let summary = import_csv(&conn, &path, None).unwrap();
        assert_eq!(summary.rows_read, 2);
        assert_eq!(summary.rows_inserted, 2);
        assert_eq!(summary.rows_skipped, 0);

        assert_eq!(crash_db::get_record_count(&conn).unwrap(), 2);

        std::fs::remove_file(&path).ok();
    }
}
