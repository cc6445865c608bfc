//! Domain types for the outreach funnel.
//!
//! Owners and stages are closed sets. Their wire names are the exact strings
//! stored in the database and exchanged over HTTP.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string did not name any variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

// ============================================================================
// Owners
// ============================================================================

/// One of the two people driving outreach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Owner {
    #[serde(rename = "Антон", alias = "Anton")]
    Anton,
    #[serde(rename = "Павел", alias = "Pavel")]
    Pavel,
}

impl Owner {
    /// Every recognized owner, in display order.
    pub const ALL: [Self; 2] = [Self::Anton, Self::Pavel];

    /// Wire/database name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anton => "Антон",
            Self::Pavel => "Павел",
        }
    }

    /// The other owner when cycling focus between the two.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Anton => Self::Pavel,
            Self::Pavel => Self::Anton,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Owner {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Антон" | "Anton" => Ok(Self::Anton),
            "Павел" | "Pavel" => Ok(Self::Pavel),
            other => Err(UnknownVariant {
                kind: "owner",
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// Funnel stages
// ============================================================================

/// Ordered outreach funnel stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "INV")]
    InviteSent,
    #[serde(rename = "ACC")]
    InviteAccepted,
    #[serde(rename = "RESP-I")]
    InviteResponse,
    #[serde(rename = "MSG")]
    MessageSent,
    #[serde(rename = "RESP-M")]
    MessageResponse,
    #[serde(rename = "INT")]
    Interested,
    #[serde(rename = "CALL")]
    CallScheduled,
    #[serde(rename = "NEXT")]
    NextSteps,
}

impl Stage {
    /// All stages in funnel order.
    pub const ALL: [Self; 8] = [
        Self::InviteSent,
        Self::InviteAccepted,
        Self::InviteResponse,
        Self::MessageSent,
        Self::MessageResponse,
        Self::Interested,
        Self::CallScheduled,
        Self::NextSteps,
    ];

    /// Stage an owner lands on when they start engaging an investor.
    pub const FIRST: Self = Self::InviteSent;

    /// Short funnel code, as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InviteSent => "INV",
            Self::InviteAccepted => "ACC",
            Self::InviteResponse => "RESP-I",
            Self::MessageSent => "MSG",
            Self::MessageResponse => "RESP-M",
            Self::Interested => "INT",
            Self::CallScheduled => "CALL",
            Self::NextSteps => "NEXT",
        }
    }

    /// Human-readable description of the stage.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::InviteSent => "Invite sent",
            Self::InviteAccepted => "Invite accepted",
            Self::InviteResponse => "Response to invite",
            Self::MessageSent => "First message sent",
            Self::MessageResponse => "Response to message",
            Self::Interested => "Interest shown",
            Self::CallScheduled => "Call scheduled",
            Self::NextSteps => "Next steps defined",
        }
    }

    /// Zero-based position in the funnel.
    #[must_use]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// Following stage, or `None` at the end of the funnel.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Preceding stage, or `None` at the start of the funnel.
    #[must_use]
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "stage",
                value: s.to_string(),
            })
    }
}

// ----------------------------------------------------------------------------
// SQLite conversions
// ----------------------------------------------------------------------------

impl ToSql for Owner {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Owner {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: UnknownVariant| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Stage {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Stage {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: UnknownVariant| FromSqlError::Other(Box::new(e)))
    }
}

// ============================================================================
// Records
// ============================================================================

/// One owner's position in the funnel for one investor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub owner_name: Owner,
    pub stage: Stage,
    pub is_active: bool,
}

impl ProgressEntry {
    /// A live entry at the given stage.
    #[must_use]
    pub const fn active(owner_name: Owner, stage: Stage) -> Self {
        Self {
            owner_name,
            stage,
            is_active: true,
        }
    }
}

/// One row of the investors ⟕ owner_progress ⟕ notes join.
///
/// Investor scalar fields repeat once per progress/note combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub investment_stage: Option<String>,
    #[serde(default)]
    pub investment_size: Option<String>,
    #[serde(default)]
    pub portfolio_companies: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub owner_name: Option<Owner>,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub note_text: Option<String>,
}

/// Nested investor record held by the client cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub id: i64,
    pub name: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub linkedin_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub investment_stage: Option<String>,
    pub investment_size: Option<String>,
    pub portfolio_companies: Option<serde_json::Value>,
    pub description: Option<String>,
    pub rating: i64,
    /// Live progress entries, at most one per owner.
    pub owner_progress: Vec<ProgressEntry>,
    pub notes: Option<String>,
}

impl Investor {
    /// Active entry for the given owner, if any.
    #[must_use]
    pub fn progress_for(&self, owner: Owner) -> Option<&ProgressEntry> {
        self.owner_progress
            .iter()
            .find(|p| p.owner_name == owner && p.is_active)
    }

    /// Whether the given owner currently has an active entry.
    #[must_use]
    pub fn is_owned_by(&self, owner: Owner) -> bool {
        self.progress_for(owner).is_some()
    }
}

/// Fields for inserting a new investor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewInvestor {
    pub name: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub linkedin_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub investment_stage: Option<String>,
    pub investment_size: Option<String>,
    pub portfolio_companies: Option<serde_json::Value>,
    pub description: Option<String>,
    pub rating: i64,
}

impl NewInvestor {
    /// Minimal investor with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub action_type: String,
    pub action_data: Option<serde_json::Value>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: String,
}
