//! Owner progress service.
//!
//! Every mutation replaces the owner's row for the investor: the old row is
//! deleted and, when a stage is given, a single active row is inserted, all in
//! one transaction. The audit entry is written after commit.

use serde_json::json;
use tracing::debug;

use crate::api::ProgressUpdate;
use crate::model::{Owner, ProgressEntry, Stage};
use crate::store::FunnelDb;

use super::audit::{AuditService, PROGRESS_UPDATE};
use super::investors::InvestorService;
use super::{CoreError, CoreResult};

/// Service for owner progress mutations.
pub struct ProgressService<'a> {
    db: &'a FunnelDb,
}

impl<'a> ProgressService<'a> {
    pub(crate) const fn new(db: &'a FunnelDb) -> Self {
        Self { db }
    }

    /// Move an owner to `stage`, replacing whatever stage they were at.
    pub fn set_stage(
        &self,
        investor_id: i64,
        owner: Owner,
        stage: Stage,
    ) -> CoreResult<Option<ProgressEntry>> {
        self.replace(investor_id, owner, Some(stage))
    }

    /// Start (at the first stage) or stop an owner's engagement.
    pub fn set_owner_active(
        &self,
        investor_id: i64,
        owner: Owner,
        active: bool,
    ) -> CoreResult<Option<ProgressEntry>> {
        self.replace(investor_id, owner, active.then_some(Stage::FIRST))
    }

    /// Apply a wire-level update from `POST /api/progress`.
    pub fn apply(&self, update: &ProgressUpdate) -> CoreResult<Option<ProgressEntry>> {
        self.replace(update.investor_id, update.owner_name, update.target_stage())
    }

    /// Live entries for an investor.
    pub fn for_investor(&self, investor_id: i64) -> CoreResult<Vec<ProgressEntry>> {
        self.db
            .progress_for(investor_id)
            .map_err(CoreError::Internal)
    }

    fn replace(
        &self,
        investor_id: i64,
        owner: Owner,
        stage: Option<Stage>,
    ) -> CoreResult<Option<ProgressEntry>> {
        InvestorService::new(self.db).require(investor_id)?;

        self.db
            .replace_progress(investor_id, owner, stage)
            .map_err(CoreError::Internal)?;

        debug!(investor_id, owner = %owner, stage = ?stage, "replaced owner progress");

        AuditService::new(self.db).record_quietly(
            PROGRESS_UPDATE,
            &json!({
                "investor_id": investor_id,
                "owner_name": owner,
                "stage": stage,
                "is_active": stage.is_some(),
            }),
        );

        Ok(stage.map(|stage| ProgressEntry::active(owner, stage)))
    }
}
