//! HTTP handler functions for the crash map API.
//!
//! Queries run synchronously on pooled read-only `DuckDB` connections;
//! they are sidebar-sized reads, not long scans.

use actix_web::{HttpResponse, web};
use crash_map_crash_models::RadiusQuery;
use crash_map_database::{crash_db, hotspot_db};
use crash_map_database_models::HotspotQuery;
use crash_map_server_models::{
    ApiCrash, ApiCrashDetail, ApiHealth, ApiHotspot, ApiStats, CrashListParams,
    HotspotQueryParams, RadiusSearchParams, RadiusSearchResponse, TopSeverityParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/hotspots`
///
/// Lists hotspots ordered by descending severity index, with optional
/// `minCrashes` and `minSeverity` filters.
pub async fn hotspots(
    state: web::Data<AppState>,
    params: web::Query<HotspotQueryParams>,
) -> HttpResponse {
    let query = HotspotQuery {
        min_crashes: params.min_crashes,
        min_severity: params.min_severity,
        limit: None,
    };

    let conn = state.pool.acquire();
    match hotspot_db::list_hotspots(&conn, &query) {
        Ok(rows) => {
            let hotspots: Vec<ApiHotspot> = rows.into_iter().map(ApiHotspot::from).collect();
            HttpResponse::Ok().json(hotspots)
        }
        Err(e) => {
            log::error!("Failed to query hotspots: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query hotspots"
            }))
        }
    }
}

/// `GET /api/hotspots/top-severity`
///
/// Returns the top N hotspots by severity index (default 10).
pub async fn top_severity(
    state: web::Data<AppState>,
    params: web::Query<TopSeverityParams>,
) -> HttpResponse {
    let limit = params.limit.unwrap_or(10);

    let conn = state.pool.acquire();
    match hotspot_db::top_by_severity(&conn, limit) {
        Ok(rows) => {
            let hotspots: Vec<ApiHotspot> = rows.into_iter().map(ApiHotspot::from).collect();
            HttpResponse::Ok().json(hotspots)
        }
        Err(e) => {
            log::error!("Failed to query top hotspots: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query hotspots"
            }))
        }
    }
}

/// `GET /api/hotspots/{id}`
pub async fn hotspot_detail(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();

    let conn = state.pool.acquire();
    match hotspot_db::get_hotspot(&conn, id) {
        Ok(Some(row)) => HttpResponse::Ok().json(ApiHotspot::from(row)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Hotspot not found"
        })),
        Err(e) => {
            log::error!("Failed to query hotspot {id}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query hotspot"
            }))
        }
    }
}

/// `GET /api/crashes`
///
/// Lists crashes ordered by descending crash date.
pub async fn crashes(
    state: web::Data<AppState>,
    params: web::Query<CrashListParams>,
) -> HttpResponse {
    let conn = state.pool.acquire();
    match crash_db::list_crashes(&conn, params.limit) {
        Ok(records) => {
            let crashes: Vec<ApiCrash> = records.iter().map(ApiCrash::from).collect();
            HttpResponse::Ok().json(crashes)
        }
        Err(e) => {
            log::error!("Failed to query crashes: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query crashes"
            }))
        }
    }
}

/// `GET /api/crashes/{id}`
pub async fn crash_detail(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let collision_id = path.into_inner();

    let conn = state.pool.acquire();
    match crash_db::get_crash(&conn, collision_id) {
        Ok(Some(record)) => HttpResponse::Ok().json(ApiCrashDetail::from(record)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Crash not found"
        })),
        Err(e) => {
            log::error!("Failed to query crash {collision_id}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query crash"
            }))
        }
    }
}

/// `GET /api/crashes/search?lat=&lon=&radius=`
///
/// Bounding-box radius search around a center point. Missing or
/// non-numeric parameters are rejected with a 400.
pub async fn crash_search(
    state: web::Data<AppState>,
    params: web::Query<RadiusSearchParams>,
) -> HttpResponse {
    let query = match RadiusQuery::from_params(
        params.lat.as_deref(),
        params.lon.as_deref(),
        params.radius.as_deref(),
    ) {
        Ok(query) => query,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string()
            }));
        }
    };

    let conn = state.pool.acquire();
    match crash_db::search_in_radius(&conn, &query) {
        Ok(records) => {
            let results: Vec<ApiCrash> = records.iter().map(ApiCrash::from).collect();
            HttpResponse::Ok().json(RadiusSearchResponse {
                count: results.len(),
                results,
            })
        }
        Err(e) => {
            log::error!("Failed radius search: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to search crashes"
            }))
        }
    }
}

/// `GET /api/crashes/stats`
pub async fn crash_stats(state: web::Data<AppState>) -> HttpResponse {
    let conn = state.pool.acquire();
    match crash_db::get_stats(&conn) {
        Ok(stats) => HttpResponse::Ok().json(ApiStats::from(stats)),
        Err(e) => {
            log::error!("Failed to query stats: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query stats"
            }))
        }
    }
}
