//! Service layer for funnel-core.
//!
//! Wraps a single store connection with typed, high-level operations for
//! investors, owner progress, notes, the audit log, and bulk import. Every
//! mutation that succeeds appends exactly one audit entry.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use funnel_core::core::FunnelServices;
//! use funnel_core::model::{Owner, Stage};
//! use funnel_core::store::DbPool;
//!
//! let pool = DbPool::open(Path::new("funnel.db"), 4, Duration::from_secs(5)).unwrap();
//! let db = pool.get().unwrap();
//! let services = FunnelServices::new(&db);
//! services.progress().set_stage(1, Owner::Anton, Stage::MessageSent).unwrap();
//! ```

pub mod audit;
pub mod errors;
pub mod import;
pub mod investors;
pub mod notes;
pub mod progress;

pub use audit::RequestOrigin;
pub use errors::{CoreError, CoreResult, ImportError};
pub use import::{ImportReport, SeedOutcome};

use crate::store::FunnelDb;

/// Facade providing all funnel service APIs over one connection.
#[derive(Clone, Copy)]
pub struct FunnelServices<'a> {
    db: &'a FunnelDb,
}

impl<'a> FunnelServices<'a> {
    #[must_use]
    pub const fn new(db: &'a FunnelDb) -> Self {
        Self { db }
    }

    /// Access investor reads.
    #[must_use]
    pub const fn investors(&self) -> investors::InvestorService<'a> {
        investors::InvestorService::new(self.db)
    }

    /// Access owner progress mutations.
    #[must_use]
    pub const fn progress(&self) -> progress::ProgressService<'a> {
        progress::ProgressService::new(self.db)
    }

    /// Access note mutations.
    #[must_use]
    pub const fn notes(&self) -> notes::NoteService<'a> {
        notes::NoteService::new(self.db)
    }

    /// Access the audit log.
    #[must_use]
    pub const fn audit(&self) -> audit::AuditService<'a> {
        audit::AuditService::new(self.db)
    }

    /// Access bulk import.
    #[must_use]
    pub const fn import(&self) -> import::ImportService<'a> {
        import::ImportService::new(self.db)
    }

    /// Get a reference to the underlying store connection.
    #[must_use]
    pub const fn db(&self) -> &'a FunnelDb {
        self.db
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::NewInvestor;
    use crate::store::FunnelDb;

    pub fn setup() -> FunnelDb {
        let db = FunnelDb::open_in_memory().unwrap();
        db.init_schema().unwrap();
        db
    }

    pub fn add_investor(db: &FunnelDb, name: &str) -> i64 {
        db.insert_investor_if_absent(&NewInvestor::named(name))
            .unwrap()
            .unwrap()
    }

    pub fn log_count(db: &FunnelDb, action_type: &str) -> i64 {
        db.conn()
            .query_row(
                "SELECT COUNT(*) FROM logs WHERE action_type = ?",
                [action_type],
                |row| row.get(0),
            )
            .unwrap()
    }
}
