//! Wire types shared by the HTTP server and its clients.

use serde::{Deserialize, Serialize};

use crate::model::{Owner, Stage};

/// Default page size for `GET /api/logs`.
pub const DEFAULT_LOG_LIMIT: i64 = 100;

/// Body of `POST /api/progress`.
///
/// A missing stage or `is_active: false` clears the owner's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub investor_id: i64,
    pub owner_name: Owner,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub is_active: bool,
}

impl ProgressUpdate {
    /// The stage to store, or `None` when this update only clears.
    #[must_use]
    pub fn target_stage(&self) -> Option<Stage> {
        self.stage.filter(|_| self.is_active)
    }
}

/// Body of `POST /api/notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    pub investor_id: i64,
    #[serde(default)]
    pub note_text: Option<String>,
}

/// Query string of `GET /api/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

const fn default_limit() -> i64 {
    DEFAULT_LOG_LIMIT
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            action_type: None,
            limit: DEFAULT_LOG_LIMIT,
            offset: 0,
        }
    }
}

/// Body of `POST /api/logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub action_type: String,
    #[serde(default)]
    pub action_data: Option<serde_json::Value>,
}

/// Envelope every endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    // No `default` here: it would add a `T: Default` bound to Deserialize.
    // A missing `Option` field already decodes as `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// Bare `{"success": true}`.
    #[must_use]
    pub const fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}
