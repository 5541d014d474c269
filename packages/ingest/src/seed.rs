//! Deterministic synthetic crash data for development and testing.
//!
//! Generates plausible NYC collision records scattered around borough
//! centers. The generator is driven by a seeded congruential generator,
//! so a fixed seed always produces the same records — no fixture files
//! to maintain, no flaky test data.

use chrono::{Duration, Utc};
use crash_map_crash_models::CrashRecord;
use crash_map_database::crash_db;
use duckdb::Connection;

use crate::IngestError;

/// NYC boroughs with their approximate centers.
const BOROUGHS: &[(&str, f64, f64)] = &[
    ("MANHATTAN", 40.7831, -73.9712),
    ("BROOKLYN", 40.6782, -73.9442),
    ("QUEENS", 40.7282, -73.7949),
    ("BRONX", 40.8448, -73.8648),
    ("STATEN ISLAND", 40.5795, -74.1502),
];

const CONTRIBUTING_FACTORS: &[&str] = &[
    "Driver Inattention/Distraction",
    "Following Too Closely",
    "Unsafe Speed",
    "Failure to Yield Right-of-Way",
    "Passing or Lane Usage Improper",
    "Backing Unsafely",
    "Turning Improperly",
    "Traffic Control Disregarded",
];

const VEHICLE_TYPES: &[&str] = &[
    "PASSENGER VEHICLE",
    "SPORT UTILITY / STATION WAGON",
    "TAXI",
    "PICK-UP TRUCK",
    "BICYCLE",
    "MOTORCYCLE",
    "BUS",
    "VAN",
];

const STREET_NAMES: &[&str] = &[
    "BROADWAY",
    "5TH AVE",
    "FLATBUSH AVE",
    "ATLANTIC AVE",
    "QUEENS BLVD",
    "NORTHERN BLVD",
    "FORDHAM RD",
    "WHITE PLAINS RD",
    "HYLAN BLVD",
    "VICTORY BLVD",
];

/// Seeded congruential generator; good enough for fixture data and
/// fully reproducible.
struct SeedRng(u64);

impl SeedRng {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    /// Uniform integer in `0..bound`.
    #[allow(clippy::cast_possible_truncation)]
    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound.max(1)
    }

    /// Uniform float in `[-spread, spread]`.
    #[allow(clippy::cast_precision_loss)]
    fn offset(&mut self, spread: f64) -> f64 {
        let unit = (self.next() % 1_000_000) as f64 / 1_000_000.0;
        (unit * 2.0 - 1.0) * spread
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[usize::try_from(self.below(items.len() as u64)).unwrap_or(0)]
    }
}

/// Generates `count` synthetic crash records from the given seed.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn generate_crashes(count: u32, seed: u64) -> Vec<CrashRecord> {
    let mut rng = SeedRng(seed);
    let base_collision_id = 100_000_000i64;
    let now = Utc::now();

    (0..count)
        .map(|i| {
            let (borough, base_lat, base_lon) =
                BOROUGHS[usize::try_from(rng.below(BOROUGHS.len() as u64)).unwrap_or(0)];

            let latitude = base_lat + rng.offset(0.1);
            let longitude = base_lon + rng.offset(0.1);

            let crash_date = now
                - Duration::days(rng.below(730) as i64)
                - Duration::minutes(rng.below(24 * 60) as i64);
            let crash_time = format!("{:02}:{:02}", rng.below(24), rng.below(60));

            let persons_injured = rng.below(6) as i32;
            // Fatalities are rare: one crash in ten gets any.
            let persons_killed = if rng.below(10) == 0 {
                rng.below(3) as i32
            } else {
                0
            };

            // Split totals across pedestrians, cyclists, and motorists.
            let pedestrians_injured = (rng.below(3) as i32).min(persons_injured);
            let pedestrians_killed = (rng.below(2) as i32).min(persons_killed);
            let cyclists_injured = (rng.below(2) as i32).min(persons_injured - pedestrians_injured);
            let cyclists_killed = (rng.below(2) as i32).min(persons_killed - pedestrians_killed);
            let motorists_injured = persons_injured - pedestrians_injured - cyclists_injured;
            let motorists_killed = persons_killed - pedestrians_killed - cyclists_killed;

            let on_street_name = rng.pick(STREET_NAMES).to_string();
            let cross_street_name = rng.pick(STREET_NAMES).to_string();

            CrashRecord {
                collision_id: base_collision_id + i64::from(i),
                crash_date,
                crash_time,
                latitude: Some(latitude),
                longitude: Some(longitude),
                borough: borough.to_string(),
                zip_code: format!("1{:04}", rng.below(10_000)),
                on_street_name,
                cross_street_name,
                off_street_name: String::new(),
                persons_injured,
                persons_killed,
                pedestrians_injured,
                pedestrians_killed,
                cyclists_injured,
                cyclists_killed,
                motorists_injured,
                motorists_killed,
                contributing_factor_1: rng.pick(CONTRIBUTING_FACTORS).to_string(),
                contributing_factor_2: if rng.below(3) == 0 {
                    rng.pick(CONTRIBUTING_FACTORS).to_string()
                } else {
                    String::new()
                },
                vehicle_type_1: rng.pick(VEHICLE_TYPES).to_string(),
                vehicle_type_2: if rng.below(2) == 0 {
                    rng.pick(VEHICLE_TYPES).to_string()
                } else {
                    String::new()
                },
            }
        })
        .collect()
}

/// Seeds the database with synthetic crash records.
///
/// When `clear` is set, existing crash records are deleted first.
/// Returns the number of records inserted.
///
/// # Errors
///
/// Returns [`IngestError`] if any database operation fails.
pub fn seed_crashes(
    conn: &Connection,
    count: u32,
    seed: u64,
    clear: bool,
) -> Result<u64, IngestError> {
    if clear {
        let removed = crash_db::clear_crashes(conn)?;
        log::info!("Cleared {removed} existing crash records");
    }

    let records = generate_crashes(count, seed);
    let inserted = crash_db::insert_crashes(conn, &records)?;
    log::info!("Seeded {inserted} synthetic crash records");

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_for_a_fixed_seed() {
        let a = generate_crashes(20, 7);
        let b = generate_crashes(20, 7);
        // crash_date depends on the wall clock, so compare stable fields.
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.collision_id, y.collision_id);
            assert_eq!(x.latitude, y.latitude);
            assert_eq!(x.longitude, y.longitude);
            assert_eq!(x.borough, y.borough);
            assert_eq!(x.persons_injured, y.persons_injured);
            assert_eq!(x.persons_killed, y.persons_killed);
        }
    }

    #[test]
    fn breakdowns_never_exceed_totals() {
        for record in generate_crashes(200, 99) {
            assert!(record.persons_injured >= 0);
            assert!(record.persons_killed >= 0);
            assert_eq!(
                record.pedestrians_injured + record.cyclists_injured + record.motorists_injured,
                record.persons_injured
            );
            assert_eq!(
                record.pedestrians_killed + record.cyclists_killed + record.motorists_killed,
                record.persons_killed
            );
            assert!(record.motorists_injured >= 0);
            assert!(record.motorists_killed >= 0);
        }
    }

    #[test]
    fn every_record_has_coordinates_near_a_borough_center() {
        for record in generate_crashes(50, 3) {
            let lat = record.latitude.unwrap();
            let lon = record.longitude.unwrap();
            let near_some_center = BOROUGHS.iter().any(|&(_, center_lat, center_lon)| {
                (lat - center_lat).abs() <= 0.1 && (lon - center_lon).abs() <= 0.1
            });
            assert!(near_some_center, "({lat}, {lon}) far from every borough");
        }
    }

    #[test]
    fn seed_inserts_and_clear_replaces() {
        let conn = Connection::open_in_memory().unwrap();
        crash_map_database::create_schema(&conn).unwrap();

        assert_eq!(seed_crashes(&conn, 10, 1, false).unwrap(), 10);
        assert_eq!(crash_db::get_record_count(&conn).unwrap(), 10);

        // Same seed upserts the same IDs; count stays put.
        seed_crashes(&conn, 10, 1, false).unwrap();
        assert_eq!(crash_db::get_record_count(&conn).unwrap(), 10);

        seed_crashes(&conn, 5, 2, true).unwrap();
        assert_eq!(crash_db::get_record_count(&conn).unwrap(), 5);
    }
}
