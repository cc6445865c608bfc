//! Shared helpers for CLI commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use funnel_core::store::{pool::DEFAULT_ACQUIRE_TIMEOUT, DbPool};

use crate::cli::DbArgs;

/// Open the connection pool described by the database arguments.
///
/// Creates the database file and schema if they do not exist yet.
pub fn open_pool(db: &DbArgs) -> Result<DbPool> {
    DbPool::open(&db.database, db.pool_size, DEFAULT_ACQUIRE_TIMEOUT)
        .with_context(|| format!("Failed to open database {}", db.database.display()))
}

/// Accept a bare path or a `sqlite:` URL for `--database` / `DATABASE_URL`.
pub fn parse_database_path(raw: &str) -> Result<PathBuf, String> {
    let trimmed = raw.trim();
    let path = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);

    if path.is_empty() {
        return Err("database path must not be empty".to_string());
    }
    if path.contains("://") {
        return Err(format!("unsupported database URL '{raw}'; expected a SQLite path"));
    }
    Ok(PathBuf::from(path))
}
