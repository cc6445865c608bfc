//! Intent dispatch: the only path from the UI to the backend.
//!
//! Each intent is written through a [`FunnelClient`] and mirrored into the
//! [`Dashboard`] cache only once the backend confirms it. A failed write
//! leaves the cache untouched and returns the error for the status line.

use anyhow::Result;
use serde_json::json;
use tracing::debug;

use funnel_core::api::{NewLogEntry, NoteUpdate, ProgressUpdate};
use funnel_core::core::audit::{OWNER_TOGGLE, STAGE_UPDATE};
use funnel_core::model::{Owner, ProgressEntry, Stage};

use crate::client::FunnelClient;
use crate::state::Dashboard;

/// A user action that changes stored data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SetStage {
        investor_id: i64,
        owner: Owner,
        stage: Stage,
    },
    /// `active: true` starts the owner at the first stage.
    ToggleOwner {
        investor_id: i64,
        owner: Owner,
        active: bool,
    },
    /// Blank text deletes the note.
    SaveNote { investor_id: i64, text: String },
}

/// Apply `intent` through `client`, then mirror it into `dashboard`.
pub fn dispatch(client: &dyn FunnelClient, dashboard: &mut Dashboard, intent: Intent) -> Result<()> {
    match intent {
        Intent::SetStage {
            investor_id,
            owner,
            stage,
        } => {
            client.save_progress(&ProgressUpdate {
                investor_id,
                owner_name: owner,
                stage: Some(stage),
                is_active: true,
            })?;
            dashboard.apply_progress(investor_id, owner, Some(ProgressEntry::active(owner, stage)));
            log_quietly(
                client,
                STAGE_UPDATE,
                json!({ "investor_id": investor_id, "owner_name": owner, "stage": stage }),
            );
        }
        Intent::ToggleOwner {
            investor_id,
            owner,
            active,
        } => {
            let stage = active.then_some(Stage::FIRST);
            client.save_progress(&ProgressUpdate {
                investor_id,
                owner_name: owner,
                stage,
                is_active: active,
            })?;
            dashboard.apply_progress(
                investor_id,
                owner,
                stage.map(|s| ProgressEntry::active(owner, s)),
            );
            log_quietly(
                client,
                OWNER_TOGGLE,
                json!({ "investor_id": investor_id, "owner_name": owner, "is_checked": active }),
            );
        }
        Intent::SaveNote { investor_id, text } => {
            let trimmed = text.trim();
            let note = (!trimmed.is_empty()).then(|| trimmed.to_string());
            client.save_note(&NoteUpdate {
                investor_id,
                note_text: note.clone(),
            })?;
            dashboard.apply_note(investor_id, note);
        }
    }
    Ok(())
}

fn log_quietly(client: &dyn FunnelClient, action_type: &str, data: serde_json::Value) {
    let entry = NewLogEntry {
        action_type: action_type.to_string(),
        action_data: Some(data),
    };
    if let Err(err) = client.log_action(&entry) {
        debug!(action_type, error = %err, "failed to log client action");
    }
}
