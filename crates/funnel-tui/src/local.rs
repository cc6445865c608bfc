//! `FunnelClient` backed by funnel-core services (no server).

use anyhow::Result;

use funnel_core::api::{NewLogEntry, NoteUpdate, ProgressUpdate};
use funnel_core::core::{FunnelServices, RequestOrigin};
use funnel_core::model::FlatRow;
use funnel_core::store::DbPool;

use crate::client::FunnelClient;

/// Client that calls the service layer directly.
pub struct LocalClient {
    pool: DbPool,
}

impl LocalClient {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn origin() -> RequestOrigin {
        RequestOrigin {
            user_agent: Some(format!("funnel-tui/{} (local)", env!("CARGO_PKG_VERSION"))),
            ip_address: None,
        }
    }
}

impl FunnelClient for LocalClient {
    fn fetch_rows(&self) -> Result<Vec<FlatRow>> {
        let db = self.pool.get()?;
        Ok(FunnelServices::new(&db).investors().flat()?)
    }

    fn save_progress(&self, update: &ProgressUpdate) -> Result<()> {
        let db = self.pool.get()?;
        FunnelServices::new(&db).progress().apply(update)?;
        Ok(())
    }

    fn save_note(&self, update: &NoteUpdate) -> Result<()> {
        let db = self.pool.get()?;
        FunnelServices::new(&db)
            .notes()
            .apply(update.investor_id, update.note_text.as_deref())?;
        Ok(())
    }

    fn log_action(&self, entry: &NewLogEntry) -> Result<()> {
        let db = self.pool.get()?;
        FunnelServices::new(&db).audit().record(
            &entry.action_type,
            entry.action_data.as_ref(),
            Some(&Self::origin()),
        )?;
        Ok(())
    }
}
