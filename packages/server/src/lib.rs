#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web read-only API server for the crash map.
//!
//! Serves hotspot listings, crash lookups, radius search, and aggregate
//! statistics from the crash `DuckDB` database. The pipeline tools write
//! that database; this server only ever opens it read-only, so it can
//! run alongside a regeneration job without blocking it.

mod handlers;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};

/// Simple round-robin pool of read-only `DuckDB` connections.
///
/// `duckdb::Connection` is `Send` but not `Sync`, so each connection is
/// wrapped in a `Mutex`. The pool hands out connections round-robin via
/// an atomic counter, allowing concurrent queries on different
/// connections.
pub struct DuckDbPool {
    connections: Vec<Mutex<duckdb::Connection>>,
    next: AtomicUsize,
}

impl DuckDbPool {
    /// Opens `size` read-only connections to the crash `DuckDB` at
    /// `path`.
    ///
    /// # Panics
    ///
    /// Panics if any connection fails to open.
    #[must_use]
    pub fn new(path: &Path, size: usize) -> Self {
        let connections = (0..size)
            .map(|_| {
                let conn = crash_map_database::open_read_only(path)
                    .expect("Failed to open DuckDB connection for pool");
                Mutex::new(conn)
            })
            .collect();
        Self {
            connections,
            next: AtomicUsize::new(0),
        }
    }

    /// Acquires the next connection from the pool (round-robin).
    ///
    /// # Panics
    ///
    /// Panics if the `Mutex` is poisoned.
    pub fn acquire(&self) -> std::sync::MutexGuard<'_, duckdb::Connection> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.connections[idx]
            .lock()
            .expect("DuckDB pool mutex poisoned")
    }
}

/// Shared application state.
pub struct AppState {
    /// Pool of read-only connections to the crash database.
    pub pool: Arc<DuckDbPool>,
}

/// Starts the crash map API server.
///
/// Opens the read-only connection pool and starts the Actix-Web HTTP
/// server. This is a regular async function — the caller is responsible
/// for providing the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if the crash database cannot be opened read-only (run the
/// ingest tool first to create it).
pub async fn run_server() -> std::io::Result<()> {
    let db_path = std::env::var("CRASH_MAP_DB").map_or_else(
        |_| crash_map_database::paths::crash_db_path(),
        std::path::PathBuf::from,
    );

    log::info!("Opening crash database at {}...", db_path.display());
    let pool = DuckDbPool::new(&db_path, 4);

    let state = web::Data::new(AppState {
        pool: Arc::new(pool),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route(
                        "/hotspots/top-severity",
                        web::get().to(handlers::top_severity),
                    )
                    .route("/hotspots/{id}", web::get().to(handlers::hotspot_detail))
                    .route("/hotspots", web::get().to(handlers::hotspots))
                    .route("/crashes/search", web::get().to(handlers::crash_search))
                    .route("/crashes/stats", web::get().to(handlers::crash_stats))
                    .route("/crashes/{id}", web::get().to(handlers::crash_detail))
                    .route("/crashes", web::get().to(handlers::crashes)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
