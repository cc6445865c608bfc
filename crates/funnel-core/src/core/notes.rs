//! Note service. At most one live note per investor.

use serde_json::json;
use tracing::debug;

use crate::store::FunnelDb;

use super::audit::{AuditService, NOTE_UPDATE};
use super::investors::InvestorService;
use super::{CoreError, CoreResult};

/// Service for note mutations.
pub struct NoteService<'a> {
    db: &'a FunnelDb,
}

impl<'a> NoteService<'a> {
    pub(crate) const fn new(db: &'a FunnelDb) -> Self {
        Self { db }
    }

    /// Replace the investor's note with the trimmed text.
    ///
    /// Blank text deletes the note. Returns the stored value.
    pub fn set_note(&self, investor_id: i64, text: &str) -> CoreResult<Option<String>> {
        InvestorService::new(self.db).require(investor_id)?;

        let trimmed = text.trim();
        let stored = (!trimmed.is_empty()).then(|| trimmed.to_string());

        self.db
            .replace_note(investor_id, stored.as_deref())
            .map_err(CoreError::Internal)?;

        debug!(investor_id, deleted = stored.is_none(), "replaced note");

        AuditService::new(self.db).record_quietly(
            NOTE_UPDATE,
            &json!({ "investor_id": investor_id, "note_text": stored }),
        );

        Ok(stored)
    }

    /// Wire form: a missing note clears.
    pub fn apply(&self, investor_id: i64, text: Option<&str>) -> CoreResult<Option<String>> {
        self.set_note(investor_id, text.unwrap_or_default())
    }

    /// The live note, if any.
    pub fn get(&self, investor_id: i64) -> CoreResult<Option<String>> {
        self.db.note_for(investor_id).map_err(CoreError::Internal)
    }
}
