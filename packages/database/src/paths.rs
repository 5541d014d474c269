#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the crash `DuckDB` data directory.
//!
//! All paths are relative to the project root's `data/` directory.

use std::path::{Path, PathBuf};

use crate::DbError;

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the path for the crash `DuckDB` file.
#[must_use]
pub fn crash_db_path() -> PathBuf {
    data_dir().join("crash_map.duckdb")
}

/// Creates a directory (and parents) if it does not already exist.
///
/// # Errors
///
/// Returns [`DbError`] if directory creation fails.
pub fn ensure_dir(path: &Path) -> Result<(), DbError> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
