#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crash record types shared across the crash-map system.
//!
//! This crate defines the canonical collision record shape ([`CrashRecord`]),
//! the fixed-field pipeline input ([`CrashPoint`]) consumed by the hotspot
//! generation pipeline, and the validated radius-search parameters
//! ([`RadiusQuery`]) used by the crash search endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rough meters-per-degree conversion used for both hotspot radii and
/// radius-search windows. Uniform in both axes; overstates east-west
/// distance away from the equator, which is acceptable at single-city
/// scale.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Default search radius in meters when the caller omits `radius`.
pub const DEFAULT_RADIUS_METERS: f64 = 1000.0;

/// The minimal crash shape consumed by the clustering pipeline.
///
/// A snapshot projection of [`CrashRecord`] restricted to records with
/// known coordinates. The pipeline never mutates these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrashPoint {
    /// Collision ID from the source system.
    pub id: i64,
    /// Latitude in decimal degrees (WGS84).
    pub latitude: f64,
    /// Longitude in decimal degrees (WGS84).
    pub longitude: f64,
    /// Total persons injured.
    pub injured: i32,
    /// Total persons killed.
    pub killed: i32,
}

/// A full collision record as stored in the crashes table.
///
/// Coordinates are optional: source exports include records that were
/// never geocoded. Such records are stored but excluded from clustering
/// snapshots and radius search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashRecord {
    /// Collision ID from the source system (primary key).
    pub collision_id: i64,
    /// When the crash occurred.
    pub crash_date: DateTime<Utc>,
    /// Time of day as reported (e.g. "14:30").
    pub crash_time: String,
    /// Latitude in decimal degrees, if geocoded.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees, if geocoded.
    pub longitude: Option<f64>,
    /// Borough name, uppercased as reported.
    pub borough: String,
    /// ZIP code as reported.
    pub zip_code: String,
    /// Street the crash occurred on.
    pub on_street_name: String,
    /// Nearest cross street.
    pub cross_street_name: String,
    /// Off-street location (parking lot, driveway).
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
}

impl CrashRecord {
    /// Per-record severity score: injuries count 1, fatalities count 10.
    #[must_use]
    pub const fn total_severity(&self) -> i32 {
        self.persons_injured + self.persons_killed * 10
    }

    /// Returns the record as a pipeline [`CrashPoint`], or `None` if the
    /// record has no coordinates.
    #[must_use]
    pub fn as_point(&self) -> Option<CrashPoint> {
        let latitude = self.latitude?;
        let longitude = self.longitude?;
        Some(CrashPoint {
            id: self.collision_id,
            latitude,
            longitude,
            injured: self.persons_injured,
            killed: self.persons_killed,
        })
    }
}

/// Error returned when radius-search parameters are missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidParameter {
    /// `lat` or `lon` was not supplied.
    #[error("latitude and longitude are required")]
    MissingCoordinates,

    /// A parameter could not be parsed as a number.
    #[error("invalid {name} value: {value:?}")]
    NotNumeric {
        /// Parameter name (`lat`, `lon`, or `radius`).
        name: &'static str,
        /// The raw value as supplied.
        value: String,
    },

    /// The radius was zero or negative.
    #[error("radius must be a positive number of meters")]
    NonPositiveRadius,
}

/// The latitude/longitude window a radius search filters against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchBounds {
    /// Minimum latitude.
    pub lat_min: f64,
    /// Maximum latitude.
    pub lat_max: f64,
    /// Minimum longitude.
    pub lon_min: f64,
    /// Maximum longitude.
    pub lon_max: f64,
}

impl SearchBounds {
    /// Whether a coordinate pair falls inside the window.
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.lat_min
            && latitude <= self.lat_max
            && longitude >= self.lon_min
            && longitude <= self.lon_max
    }
}

/// Validated radius-search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusQuery {
    /// Search center latitude in decimal degrees.
    pub latitude: f64,
    /// Search center longitude in decimal degrees.
    pub longitude: f64,
    /// Search radius in meters.
    pub radius_meters: f64,
}

impl RadiusQuery {
    /// Parses raw query-string parameters into a validated query.
    ///
    /// `radius` defaults to [`DEFAULT_RADIUS_METERS`] when omitted.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameter`] when `lat` or `lon` is missing, when
    /// any supplied value is not a number, or when the radius is not
    /// positive.
    pub fn from_params(
        lat: Option<&str>,
        lon: Option<&str>,
        radius: Option<&str>,
    ) -> Result<Self, InvalidParameter> {
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Err(InvalidParameter::MissingCoordinates);
        };

        let latitude: f64 = lat.parse().map_err(|_| InvalidParameter::NotNumeric {
            name: "lat",
            value: lat.to_string(),
        })?;
        let longitude: f64 = lon.parse().map_err(|_| InvalidParameter::NotNumeric {
            name: "lon",
            value: lon.to_string(),
        })?;

        let radius_meters = match radius {
            Some(r) => r.parse().map_err(|_| InvalidParameter::NotNumeric {
                name: "radius",
                value: r.to_string(),
            })?,
            None => DEFAULT_RADIUS_METERS,
        };

        if radius_meters <= 0.0 {
            return Err(InvalidParameter::NonPositiveRadius);
        }

        Ok(Self {
            latitude,
            longitude,
            radius_meters,
        })
    }

    /// Computes the bounding-box window approximating the search circle.
    ///
    /// The longitude delta scales by `|latitude| / 90` rather than
    /// `cos(latitude)` — a long-standing window heuristic that widens the
    /// search away from a true geodesic circle. Callers depend on the
    /// current (loose) window, so it is preserved as-is. At the equator
    /// the delta degenerates to infinity and every longitude matches.
    #[must_use]
    pub fn bounds(&self) -> SearchBounds {
        let lat_delta = self.radius_meters / METERS_PER_DEGREE;
        let lon_delta = self.radius_meters / (METERS_PER_DEGREE * (self.latitude / 90.0).abs());

        SearchBounds {
            lat_min: self.latitude - lat_delta,
            lat_max: self.latitude + lat_delta,
            lon_min: self.longitude - lon_delta,
            lon_max: self.longitude + lon_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_counts(injured: i32, killed: i32) -> CrashRecord {
        CrashRecord {
            collision_id: 123_456_789,
            crash_date: chrono::Utc::now(),
            crash_time: "14:30".to_string(),
            latitude: Some(40.7128),
            longitude: Some(-74.0060),
            borough: "MANHATTAN".to_string(),
            zip_code: "10001".to_string(),
            on_street_name: "BROADWAY".to_string(),
            cross_street_name: "42ND ST".to_string(),
            off_street_name: String::new(),
            persons_injured: injured,
            persons_killed: killed,
            pedestrians_injured: 0,
            pedestrians_killed: 0,
            cyclists_injured: 0,
            cyclists_killed: 0,
            motorists_injured: injured,
            motorists_killed: killed,
            contributing_factor_1: "Driver Inattention/Distraction".to_string(),
            contributing_factor_2: String::new(),
            vehicle_type_1: "PASSENGER VEHICLE".to_string(),
            vehicle_type_2: String::new(),
        }
    }

    #[test]
    fn total_severity_weights_fatalities() {
        assert_eq!(record_with_counts(2, 0).total_severity(), 2);
        assert_eq!(record_with_counts(2, 1).total_severity(), 12);
        assert_eq!(record_with_counts(0, 0).total_severity(), 0);
    }

    #[test]
    fn as_point_requires_coordinates() {
        let record = record_with_counts(1, 0);
        let point = record.as_point().unwrap();
        assert_eq!(point.id, record.collision_id);
        assert_eq!(point.injured, 1);

        let mut ungeocoded = record;
        ungeocoded.latitude = None;
        assert!(ungeocoded.as_point().is_none());
    }

    #[test]
    fn parses_full_radius_params() {
        let query =
            RadiusQuery::from_params(Some("40.7589"), Some("-73.9851"), Some("500")).unwrap();
        assert!((query.latitude - 40.7589).abs() < f64::EPSILON);
        assert!((query.longitude - -73.9851).abs() < f64::EPSILON);
        assert!((query.radius_meters - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn radius_defaults_when_omitted() {
        let query = RadiusQuery::from_params(Some("40.75"), Some("-73.98"), None).unwrap();
        assert!((query.radius_meters - DEFAULT_RADIUS_METERS).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_missing_coordinates() {
        assert_eq!(
            RadiusQuery::from_params(None, Some("-73.98"), None),
            Err(InvalidParameter::MissingCoordinates)
        );
        assert_eq!(
            RadiusQuery::from_params(Some("40.75"), None, None),
            Err(InvalidParameter::MissingCoordinates)
        );
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert!(matches!(
            RadiusQuery::from_params(Some("invalid"), Some("-73.98"), None),
            Err(InvalidParameter::NotNumeric { name: "lat", .. })
        ));
        assert!(matches!(
            RadiusQuery::from_params(Some("40.75"), Some("-73.98"), Some("invalid")),
            Err(InvalidParameter::NotNumeric { name: "radius", .. })
        ));
    }

    #[test]
    fn rejects_non_positive_radius() {
        assert_eq!(
            RadiusQuery::from_params(Some("40.75"), Some("-73.98"), Some("0")),
            Err(InvalidParameter::NonPositiveRadius)
        );
        assert_eq!(
            RadiusQuery::from_params(Some("40.75"), Some("-73.98"), Some("-10")),
            Err(InvalidParameter::NonPositiveRadius)
        );
    }

    #[test]
    fn bounds_always_contain_the_center() {
        let query = RadiusQuery {
            latitude: 40.7589,
            longitude: -73.9851,
            radius_meters: 1000.0,
        };
        assert!(query.bounds().contains(40.7589, -73.9851));

        // A vanishingly small radius still admits an exact center match.
        let tiny = RadiusQuery {
            radius_meters: 0.001,
            ..query
        };
        assert!(tiny.bounds().contains(40.7589, -73.9851));
    }

    #[test]
    fn longitude_window_is_wider_than_latitude_window() {
        // At NYC latitudes |lat|/90 < 1, so the longitude delta exceeds
        // the latitude delta.
        let query = RadiusQuery {
            latitude: 40.7589,
            longitude: -73.9851,
            radius_meters: 1000.0,
        };
        let bounds = query.bounds();
        let lat_delta = bounds.lat_max - query.latitude;
        let lon_delta = bounds.lon_max - query.longitude;
        assert!(lon_delta > lat_delta);
    }

    #[test]
    fn equator_window_admits_every_longitude() {
        let query = RadiusQuery {
            latitude: 0.0,
            longitude: 10.0,
            radius_meters: 1000.0,
        };
        let bounds = query.bounds();
        assert!(bounds.lon_min.is_infinite());
        assert!(bounds.contains(0.0, 179.9));
    }
}
