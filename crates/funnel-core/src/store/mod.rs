//! SQLite store for funnel.
//!
//! Holds the four durable tables: investors, owner_progress, notes, logs.
//! Schema creation is idempotent and runs on every open of the pool.

#![allow(clippy::missing_errors_doc)]

pub mod pool;
mod query;

pub use pool::{DbPool, PooledDb};

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// A single connection to the funnel database.
pub struct FunnelDb {
    conn: Connection,
}

impl FunnelDb {
    /// Open or create a database at the given path.
    ///
    /// Creates parent directories if they don't exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create parent directories: {}", parent.display())
                })?;
            }
        }

        Self::connect(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))
    }

    /// Open and configure a connection without touching the filesystem
    /// layout. Used by the pool for every connection after the first.
    pub(crate) fn connect(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(Self { conn })
    }

    /// Create an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        Ok(Self { conn })
    }

    /// Initialize the database schema.
    ///
    /// Creates all tables and indexes if they don't exist.
    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .context("Failed to initialize schema")?;
        Ok(())
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ============================================================================
// Schema SQL
// ============================================================================

const SCHEMA_SQL: &str = r"
-- INVESTORS
CREATE TABLE IF NOT EXISTS investors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    title TEXT,
    company TEXT,
    linkedin_url TEXT,
    email TEXT,
    phone TEXT,
    location TEXT,
    industry TEXT,
    investment_stage TEXT,
    investment_size TEXT,
    portfolio_companies TEXT,
    description TEXT,
    rating INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_investors_name ON investors(name);
CREATE INDEX IF NOT EXISTS idx_investors_company ON investors(company);

-- OWNER PROGRESS
CREATE TABLE IF NOT EXISTS owner_progress (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    investor_id INTEGER NOT NULL REFERENCES investors(id) ON DELETE CASCADE,
    owner_name TEXT NOT NULL CHECK (owner_name IN ('Антон', 'Павел')),
    stage TEXT NOT NULL
        CHECK (stage IN ('INV', 'ACC', 'RESP-I', 'MSG', 'RESP-M', 'INT', 'CALL', 'NEXT')),
    is_active INTEGER NOT NULL DEFAULT 0 CHECK (is_active IN (0, 1)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (investor_id, owner_name, stage)
);

CREATE INDEX IF NOT EXISTS idx_owner_progress_investor ON owner_progress(investor_id);
CREATE INDEX IF NOT EXISTS idx_owner_progress_owner ON owner_progress(owner_name);

-- NOTES
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    investor_id INTEGER NOT NULL REFERENCES investors(id) ON DELETE CASCADE,
    note_text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_investor ON notes(investor_id);

-- LOGS
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    action_type TEXT NOT NULL,
    action_data TEXT,
    user_agent TEXT,
    ip_address TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_logs_created_at ON logs(created_at);
CREATE INDEX IF NOT EXISTS idx_logs_action_type ON logs(action_type);
";

// ============================================================================
// Tests
// ============================================================================
