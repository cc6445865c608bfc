//! Audit log service: append and list action records.

use serde_json::Value;
use tracing::warn;

use crate::api::LogQuery;
use crate::model::LogEntry;
use crate::store::FunnelDb;

use super::{CoreError, CoreResult};

/// Action type for owner progress mutations.
pub const PROGRESS_UPDATE: &str = "PROGRESS_UPDATE";
/// Action type for note mutations.
pub const NOTE_UPDATE: &str = "NOTE_UPDATE";
/// Action type for bulk imports.
pub const DATA_IMPORT: &str = "DATA_IMPORT";

// Client-side actions, submitted through `POST /api/logs`.
pub const STAGE_UPDATE: &str = "STAGE_UPDATE";
pub const OWNER_TOGGLE: &str = "OWNER_TOGGLE";

/// Where a client-submitted log entry came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Service for audit log operations.
pub struct AuditService<'a> {
    db: &'a FunnelDb,
}

impl<'a> AuditService<'a> {
    pub(crate) const fn new(db: &'a FunnelDb) -> Self {
        Self { db }
    }

    /// Append an entry. Returns its id.
    pub fn record(
        &self,
        action_type: &str,
        action_data: Option<&Value>,
        origin: Option<&RequestOrigin>,
    ) -> CoreResult<i64> {
        if action_type.trim().is_empty() {
            return Err(CoreError::invalid("action_type must not be empty"));
        }

        let id = self.db.insert_log(
            action_type,
            action_data,
            origin.and_then(|o| o.user_agent.as_deref()),
            origin.and_then(|o| o.ip_address.as_deref()),
        )?;
        Ok(id)
    }

    /// Append an entry, logging and discarding any failure.
    ///
    /// Used after a primary mutation has committed: the audit trail never
    /// blocks or rolls back the write it describes.
    pub fn record_quietly(&self, action_type: &str, action_data: &Value) {
        if let Err(err) = self.record(action_type, Some(action_data), None) {
            warn!(action_type, error = %err, "Failed to write audit log entry");
        }
    }

    /// List entries newest-first.
    pub fn list(&self, query: &LogQuery) -> CoreResult<Vec<LogEntry>> {
        if query.limit < 0 {
            return Err(CoreError::invalid("limit must not be negative"));
        }
        if query.offset < 0 {
            return Err(CoreError::invalid("offset must not be negative"));
        }

        self.db
            .list_logs(query.action_type.as_deref(), query.limit, query.offset)
            .map_err(CoreError::Internal)
    }
}
