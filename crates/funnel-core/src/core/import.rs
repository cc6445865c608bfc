//! Bulk import of evaluated investor profiles.
//!
//! The source is a JSON array of profile objects keyed by spreadsheet-style
//! column names. Import is insert-or-skip on the investor name, so running it
//! twice leaves the store unchanged.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::model::NewInvestor;
use crate::store::FunnelDb;

use super::audit::{AuditService, DATA_IMPORT};
use super::{CoreError, CoreResult, ImportError};

/// One profile from the evaluated-profiles export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(rename = "First Name", default)]
    pub first_name: Option<String>,
    #[serde(rename = "Last Name", default)]
    pub last_name: Option<String>,
    #[serde(rename = "Current Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Current Company", default)]
    pub company: Option<String>,
    #[serde(rename = "LinkedIn URL", default)]
    pub linkedin_url: Option<String>,
    #[serde(rename = "Quotes", default)]
    pub quotes: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Phone", default)]
    pub phone: Option<String>,
    #[serde(rename = "Location", default)]
    pub location: Option<String>,
    #[serde(rename = "Industry", default)]
    pub industry: Option<String>,
    /// Numeric in most exports, occasionally a string.
    #[serde(default)]
    pub investor_score: Option<Value>,
}

impl ProfileRecord {
    /// `"{first} {last}"`, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Score as an integer rating; anything unparseable is 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rating(&self) -> i64 {
        match &self.investor_score {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(|f| f.round() as i64)
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Convert to an insertable investor, or `None` when the name is empty.
    #[must_use]
    pub fn to_new_investor(&self) -> Option<NewInvestor> {
        let name = self.full_name();
        if name.is_empty() {
            return None;
        }
        Some(NewInvestor {
            name,
            title: non_blank(self.title.as_deref()),
            company: non_blank(self.company.as_deref()),
            linkedin_url: non_blank(self.linkedin_url.as_deref()),
            email: non_blank(self.email.as_deref()),
            phone: non_blank(self.phone.as_deref()),
            location: non_blank(self.location.as_deref()),
            industry: non_blank(self.industry.as_deref()),
            description: non_blank(self.quotes.as_deref()),
            rating: self.rating(),
            ..NewInvestor::default()
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Counts from one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: usize,
    /// Investors in the store after the run.
    pub total: i64,
}

/// Result of seeding an empty store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store already had investors; nothing was read.
    AlreadyLoaded { count: i64 },
    Imported(ImportReport),
}

/// Service for bulk import.
pub struct ImportService<'a> {
    db: &'a FunnelDb,
}

impl<'a> ImportService<'a> {
    pub(crate) const fn new(db: &'a FunnelDb) -> Self {
        Self { db }
    }

    /// Import every profile in the JSON file at `path`.
    pub fn import_file(&self, path: &Path) -> CoreResult<ImportReport> {
        let records = read_profiles(path)?;
        info!(path = %path.display(), records = records.len(), "importing profiles");
        self.import_records(&records)
    }

    /// Insert-or-skip each record inside one transaction.
    pub fn import_records(&self, records: &[ProfileRecord]) -> CoreResult<ImportReport> {
        let tx = self
            .db
            .conn()
            .unchecked_transaction()
            .context("Failed to begin import transaction")?;

        let mut inserted = 0;
        let mut skipped = 0;
        for record in records {
            let Some(investor) = record.to_new_investor() else {
                debug!("skipping profile without a name");
                skipped += 1;
                continue;
            };
            if self.db.insert_investor_if_absent(&investor)?.is_some() {
                inserted += 1;
            } else {
                skipped += 1;
            }
        }

        tx.commit().context("Failed to commit import")?;

        let total = self.db.count_investors().map_err(CoreError::Internal)?;
        let report = ImportReport {
            inserted,
            skipped,
            total,
        };

        info!(inserted, skipped, total, "import finished");
        AuditService::new(self.db).record_quietly(
            DATA_IMPORT,
            &json!({ "inserted": inserted, "skipped": skipped, "total": total }),
        );

        Ok(report)
    }

    /// Import `path` only when the store has no investors yet.
    pub fn seed_if_empty(&self, path: &Path) -> CoreResult<SeedOutcome> {
        let count = self.db.count_investors().map_err(CoreError::Internal)?;
        if count > 0 {
            return Ok(SeedOutcome::AlreadyLoaded { count });
        }
        Ok(SeedOutcome::Imported(self.import_file(path)?))
    }
}

/// Read and parse a profiles file.
pub fn read_profiles(path: &Path) -> Result<Vec<ProfileRecord>, ImportError> {
    let raw = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ImportError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ImportError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let records: Vec<ProfileRecord> =
        serde_json::from_str(&raw).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if records.is_empty() {
        return Err(ImportError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(records)
}
