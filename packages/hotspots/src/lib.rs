#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crash hotspot generation pipeline.
//!
//! Reads a coordinate snapshot from the crash database, partitions it
//! with k-means ([`crash_map_cluster`]), summarizes each cluster into a
//! named hotspot with aggregate severity statistics, and atomically
//! replaces the persisted hotspot collection.
//!
//! The pipeline is a run-to-completion batch job: there is no
//! incremental update. Regeneration with the same snapshot and options
//! is idempotent up to the clustering seed.

use crash_map_cluster::{ClusterError, KMeansConfig, KMeansResult, cluster};
use crash_map_crash_models::{CrashPoint, METERS_PER_DEGREE};
use crash_map_database::{DbError, crash_db, hotspot_db};
use crash_map_database_models::NewHotspot;
use duckdb::Connection;

/// Errors from the hotspot generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Clustering could not run (fewer crashes than requested clusters).
    /// Nothing is written; the previous generation stays in place.
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// Storage failure. The transactional replace guarantees the
    /// previous generation survives intact.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Options for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Target number of clusters (K).
    pub clusters: usize,
    /// Minimum member crashes for a cluster to become a hotspot.
    pub min_crashes: usize,
    /// Independent k-means restarts.
    pub restarts: usize,
    /// Clustering initialization seed.
    pub seed: u64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            clusters: 50,
            min_crashes: 5,
            restarts: KMeansConfig::DEFAULT_RESTARTS,
            seed: KMeansConfig::DEFAULT_SEED,
        }
    }
}

/// Outcome of a successful generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateSummary {
    /// Number of crash points clustered.
    pub points_clustered: usize,
    /// Number of hotspots persisted.
    pub hotspots_created: usize,
}

/// Runs the full pipeline: snapshot, cluster, summarize, replace.
///
/// Producing zero hotspots (every cluster under `min_crashes`) is a
/// valid outcome and still replaces — empties — the collection.
///
/// # Errors
///
/// Returns [`GenerateError::Cluster`] when there are fewer crash points
/// than requested clusters (nothing is written), or
/// [`GenerateError::Db`] on storage failure.
pub fn generate_hotspots(
    conn: &Connection,
    options: &GenerateOptions,
) -> Result<GenerateSummary, GenerateError> {
    let points = crash_db::load_crash_points(conn)?;

    log::info!(
        "Running k-means clustering on {} crashes ({} clusters, min {} crashes)...",
        points.len(),
        options.clusters,
        options.min_crashes
    );

    let coordinates: Vec<[f64; 2]> = points
        .iter()
        .map(|p| [p.latitude, p.longitude])
        .collect();

    let config = KMeansConfig {
        clusters: options.clusters,
        restarts: options.restarts,
        max_iterations: KMeansConfig::DEFAULT_MAX_ITERATIONS,
        seed: options.seed,
    };
    let result = cluster(&coordinates, &config)?;

    let hotspots = summarize_clusters(&points, &result, options.min_crashes);

    for hotspot in &hotspots {
        log::info!(
            "Created {}: {} crashes, severity: {}",
            hotspot.name,
            hotspot.crash_count,
            hotspot.severity_index
        );
    }

    hotspot_db::replace_hotspots(conn, &hotspots)?;

    log::info!(
        "Generated {} hotspots from {} crashes",
        hotspots.len(),
        points.len()
    );

    Ok(GenerateSummary {
        points_clustered: points.len(),
        hotspots_created: hotspots.len(),
    })
}

/// Summarizes a clustering result into hotspots.
///
/// Clusters with fewer than `min_crashes` members are dropped whole — no
/// partial or merged record is kept. Empty clusters never produce a
/// hotspot, even with `min_crashes` of zero. Surviving clusters are
/// named "Hotspot {label + 1}", so dropped labels leave gaps in the
/// numbering.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
pub fn summarize_clusters(
    points: &[CrashPoint],
    result: &KMeansResult,
    min_crashes: usize,
) -> Vec<NewHotspot> {
    let mut hotspots = Vec::new();

    for (label, members) in result.members().iter().enumerate() {
        if members.is_empty() || members.len() < min_crashes {
            continue;
        }

        let count = members.len() as f64;
        let center_lat: f64 = members.iter().map(|&i| points[i].latitude).sum::<f64>() / count;
        let center_lon: f64 = members.iter().map(|&i| points[i].longitude).sum::<f64>() / count;

        let max_degree_distance = members
            .iter()
            .map(|&i| {
                let dlat = points[i].latitude - center_lat;
                let dlon = points[i].longitude - center_lon;
                dlat.hypot(dlon)
            })
            .fold(0.0f64, f64::max);
        let radius_meters = max_degree_distance * METERS_PER_DEGREE;

        let crash_count = members.len() as i64;
        let total_injured: i64 = members.iter().map(|&i| i64::from(points[i].injured)).sum();
        let total_killed: i64 = members.iter().map(|&i| i64::from(points[i].killed)).sum();
        let severity_index = crash_count + total_injured + total_killed * 10;

        hotspots.push(NewHotspot {
            name: format!("Hotspot {}", label + 1),
            latitude: center_lat,
            longitude: center_lon,
            radius_meters,
            crash_count,
            total_injured,
            total_killed,
            severity_index,
        });
    }

    hotspots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crash_map_database_models::HotspotQuery;

    fn point(id: i64, latitude: f64, longitude: f64, injured: i32, killed: i32) -> CrashPoint {
        CrashPoint {
            id,
            latitude,
            longitude,
            injured,
            killed,
        }
    }

    /// Clusters and summarizes in one step.
    fn run(points: &[CrashPoint], clusters: usize, min_crashes: usize) -> Vec<NewHotspot> {
        let coordinates: Vec<[f64; 2]> =
            points.iter().map(|p| [p.latitude, p.longitude]).collect();
        let result = cluster(&coordinates, &KMeansConfig::new(clusters)).unwrap();
        summarize_clusters(points, &result, min_crashes)
    }

    #[test]
    fn severity_index_formula_holds_for_every_hotspot() {
        let points = vec![
            point(1, 40.7500, -73.9800, 2, 0),
            point(2, 40.7510, -73.9810, 1, 1),
            point(3, 40.7505, -73.9805, 0, 0),
            point(4, 40.9000, -73.8000, 3, 0),
            point(5, 40.9010, -73.8010, 0, 2),
        ];
        let hotspots = run(&points, 2, 0);

        assert_eq!(hotspots.len(), 2);
        for hotspot in &hotspots {
            assert_eq!(
                hotspot.severity_index,
                hotspot.crash_count + hotspot.total_injured + hotspot.total_killed * 10
            );
        }

        let totals: i64 = hotspots.iter().map(|h| h.crash_count).sum();
        assert_eq!(totals, 5);
    }

    #[test]
    fn drops_clusters_below_minimum() {
        // Two near-identical points and one far outlier: K=2 and a
        // minimum of 2 keeps only the pair's cluster.
        let points = vec![
            point(1, 40.75, -73.98, 1, 0),
            point(2, 40.751, -73.981, 0, 1),
            point(3, 40.90, -73.80, 5, 5),
        ];
        let hotspots = run(&points, 2, 2);

        assert_eq!(hotspots.len(), 1);
        let hotspot = &hotspots[0];
        assert_eq!(hotspot.crash_count, 2);
        assert_eq!(hotspot.total_injured, 1);
        assert_eq!(hotspot.total_killed, 1);
        assert_eq!(hotspot.severity_index, 2 + 1 + 10);
    }

    #[test]
    fn min_crashes_zero_keeps_every_nonempty_cluster() {
        let points = vec![
            point(1, 40.75, -73.98, 0, 0),
            point(2, 40.751, -73.981, 0, 0),
            point(3, 40.90, -73.80, 0, 0),
        ];
        let hotspots = run(&points, 2, 0);
        assert_eq!(hotspots.len(), 2);
    }

    #[test]
    fn all_clusters_below_minimum_is_a_valid_empty_outcome() {
        let points = vec![
            point(1, 40.75, -73.98, 0, 0),
            point(2, 40.90, -73.80, 0, 0),
        ];
        let hotspots = run(&points, 2, 5);
        assert!(hotspots.is_empty());
    }

    #[test]
    fn names_follow_cluster_labels_with_gaps() {
        let points = vec![
            point(1, 40.75, -73.98, 0, 0),
            point(2, 40.751, -73.981, 0, 0),
            point(3, 40.90, -73.80, 0, 0),
        ];
        // min_crashes 2 drops the singleton; the survivor keeps the name
        // derived from its own label.
        let coordinates: Vec<[f64; 2]> =
            points.iter().map(|p| [p.latitude, p.longitude]).collect();
        let result = cluster(&coordinates, &KMeansConfig::new(2)).unwrap();
        let hotspots = summarize_clusters(&points, &result, 2);

        assert_eq!(hotspots.len(), 1);
        let pair_label = result.labels[0];
        assert_eq!(hotspots[0].name, format!("Hotspot {}", pair_label + 1));
    }

    #[test]
    fn center_is_member_mean_and_radius_spans_farthest_member() {
        let points = vec![
            point(1, 40.0, -73.0, 0, 0),
            point(2, 40.2, -73.0, 0, 0),
        ];
        let coordinates: Vec<[f64; 2]> =
            points.iter().map(|p| [p.latitude, p.longitude]).collect();
        let result = cluster(&coordinates, &KMeansConfig::new(1)).unwrap();
        let hotspots = summarize_clusters(&points, &result, 0);

        assert_eq!(hotspots.len(), 1);
        let hotspot = &hotspots[0];
        assert!((hotspot.latitude - 40.1).abs() < 1e-9);
        assert!((hotspot.longitude - -73.0).abs() < 1e-9);
        // Farthest member is 0.1 degrees from the center.
        assert!((hotspot.radius_meters - 0.1 * METERS_PER_DEGREE).abs() < 1e-6);
    }

    #[test]
    fn pipeline_persists_and_regeneration_supersedes() {
        let conn = Connection::open_in_memory().unwrap();
        crash_map_database::create_schema(&conn).unwrap();

        let records: Vec<crash_map_crash_models::CrashRecord> = (0..6)
            .map(|i| sample_record(i, 40.7500 + f64::from(i) * 0.0001, -73.9800))
            .chain((6..9).map(|i| sample_record(i, 40.9000 + f64::from(i) * 0.0001, -73.8000)))
            .collect();
        crash_db::insert_crashes(&conn, &records).unwrap();

        let options = GenerateOptions {
            clusters: 2,
            min_crashes: 4,
            ..GenerateOptions::default()
        };
        let summary = generate_hotspots(&conn, &options).unwrap();
        assert_eq!(summary.points_clustered, 9);
        assert_eq!(summary.hotspots_created, 1);

        let rows = hotspot_db::list_hotspots(&conn, &HotspotQuery::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].crash_count, 6);

        // A run with a lower minimum replaces the collection entirely.
        let options = GenerateOptions {
            clusters: 2,
            min_crashes: 1,
            ..GenerateOptions::default()
        };
        generate_hotspots(&conn, &options).unwrap();
        let rows = hotspot_db::list_hotspots(&conn, &HotspotQuery::default()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn insufficient_data_leaves_previous_generation_intact() {
        let conn = Connection::open_in_memory().unwrap();
        crash_map_database::create_schema(&conn).unwrap();

        let records: Vec<crash_map_crash_models::CrashRecord> = (0..3)
            .map(|i| sample_record(i, 40.75 + f64::from(i) * 0.001, -73.98))
            .collect();
        crash_db::insert_crashes(&conn, &records).unwrap();

        let options = GenerateOptions {
            clusters: 2,
            min_crashes: 1,
            ..GenerateOptions::default()
        };
        generate_hotspots(&conn, &options).unwrap();
        let before = hotspot_db::list_hotspots(&conn, &HotspotQuery::default()).unwrap();
        assert!(!before.is_empty());

        // More clusters than points: the run aborts without writing.
        let options = GenerateOptions {
            clusters: 10,
            min_crashes: 1,
            ..GenerateOptions::default()
        };
        let err = generate_hotspots(&conn, &options).unwrap_err();
        assert!(matches!(err, GenerateError::Cluster(_)));

        let after = hotspot_db::list_hotspots(&conn, &HotspotQuery::default()).unwrap();
        assert_eq!(before, after);
    }

    fn sample_record(i: i32, latitude: f64, longitude: f64) -> crash_map_crash_models::CrashRecord {
        use chrono::TimeZone as _;

        crash_map_crash_models::CrashRecord {
            collision_id: i64::from(i) + 1,
            crash_date: chrono::Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            crash_time: "10:30".to_string(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            borough: "MANHATTAN".to_string(),
            zip_code: "10019".to_string(),
            on_street_name: "BROADWAY".to_string(),
            cross_street_name: "42ND ST".to_string(),
            off_street_name: String::new(),
            persons_injured: 1,
            persons_killed: 0,
            pedestrians_injured: 0,
            pedestrians_killed: 0,
            cyclists_injured: 0,
            cyclists_killed: 0,
            motorists_injured: 1,
            motorists_killed: 0,
            contributing_factor_1: String::new(),
            contributing_factor_2: String::new(),
            vehicle_type_1: String::new(),
            vehicle_type_2: String::new(),
        }
    }
}
