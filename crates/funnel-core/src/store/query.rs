//! Query and write API for the funnel store.
//!
//! Every multi-statement write runs inside a single transaction so that a
//! reader never observes a half-applied replacement.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::FunnelDb;
use crate::model::{FlatRow, LogEntry, NewInvestor, Owner, ProgressEntry, Stage};

/// Timestamp format used for every `*_at` column.
pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

const FLAT_ROWS_SQL: &str = "
SELECT
    i.id, i.name, i.title, i.company, i.linkedin_url, i.email, i.phone,
    i.location, i.industry, i.investment_stage, i.investment_size,
    i.portfolio_companies, i.description, i.rating, i.created_at, i.updated_at,
    op.owner_name, op.stage, op.is_active,
    n.note_text
FROM investors i
LEFT JOIN owner_progress op ON op.investor_id = i.id
LEFT JOIN notes n ON n.investor_id = i.id
ORDER BY i.name, i.id, op.owner_name, op.stage";

impl FunnelDb {
    // ========================================================================
    // Investors
    // ========================================================================

    /// Export the joined investor/progress/note projection, name-sorted.
    pub fn flat_rows(&self) -> Result<Vec<FlatRow>> {
        let mut stmt = self
            .conn
            .prepare(FLAT_ROWS_SQL)
            .context("Failed to prepare flat_rows query")?;

        let rows = stmt
            .query_map([], flat_row_from)
            .context("Failed to execute flat_rows query")?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.context("Failed to read investor row")?);
        }
        Ok(results)
    }

    /// Number of investors in the store.
    pub fn count_investors(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM investors", [], |row| row.get(0))
            .context("Failed to count investors")
    }

    /// Whether an investor with this id exists.
    pub fn investor_exists(&self, investor_id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM investors WHERE id = ?",
                params![investor_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to look up investor")?;
        Ok(found.is_some())
    }

    /// Insert an investor unless one with the same name exists.
    ///
    /// Returns the new row id, or `None` when the name was already taken.
    pub fn insert_investor_if_absent(&self, investor: &NewInvestor) -> Result<Option<i64>> {
        let now = now_ts();
        let portfolio = investor
            .portfolio_companies
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to encode portfolio_companies")?;

        let changed = self
            .conn
            .execute(
                "INSERT INTO investors (
                    name, title, company, linkedin_url, email, phone, location,
                    industry, investment_stage, investment_size, portfolio_companies,
                    description, rating, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (name) DO NOTHING",
                params![
                    investor.name,
                    investor.title,
                    investor.company,
                    investor.linkedin_url,
                    investor.email,
                    investor.phone,
                    investor.location,
                    investor.industry,
                    investor.investment_stage,
                    investor.investment_size,
                    portfolio,
                    investor.description,
                    investor.rating,
                    now,
                    now,
                ],
            )
            .with_context(|| format!("Failed to insert investor '{}'", investor.name))?;

        if changed == 0 {
            Ok(None)
        } else {
            Ok(Some(self.conn.last_insert_rowid()))
        }
    }

    // ========================================================================
    // Owner progress
    // ========================================================================

    /// All progress rows for an investor, ordered by owner.
    pub fn progress_for(&self, investor_id: i64) -> Result<Vec<ProgressEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT owner_name, stage, is_active FROM owner_progress
                 WHERE investor_id = ?
                 ORDER BY owner_name, stage",
            )
            .context("Failed to prepare progress query")?;

        let rows = stmt
            .query_map(params![investor_id], |row| {
                Ok(ProgressEntry {
                    owner_name: row.get(0)?,
                    stage: row.get(1)?,
                    is_active: row.get(2)?,
                })
            })
            .context("Failed to execute progress query")?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.context("Failed to read progress row")?);
        }
        Ok(results)
    }

    /// Replace an owner's progress on an investor.
    ///
    /// Deletes every existing row for the pair, then inserts a single active
    /// row at `stage` when one is given. Both halves commit together.
    pub fn replace_progress(
        &self,
        investor_id: i64,
        owner: Owner,
        stage: Option<Stage>,
    ) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin progress transaction")?;

        tx.execute(
            "DELETE FROM owner_progress WHERE investor_id = ? AND owner_name = ?",
            params![investor_id, owner],
        )
        .context("Failed to delete previous progress")?;

        if let Some(stage) = stage {
            let now = now_ts();
            tx.execute(
                "INSERT INTO owner_progress (
                    investor_id, owner_name, stage, is_active, created_at, updated_at
                ) VALUES (?, ?, ?, 1, ?, ?)",
                params![investor_id, owner, stage, now, now],
            )
            .context("Failed to insert progress")?;
        }

        tx.commit().context("Failed to commit progress")?;
        Ok(())
    }

    // ========================================================================
    // Notes
    // ========================================================================

    /// The live note for an investor, if any.
    pub fn note_for(&self, investor_id: i64) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT note_text FROM notes WHERE investor_id = ? ORDER BY id DESC LIMIT 1",
                params![investor_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query note")
    }

    /// Replace the note for an investor; `None` only deletes.
    pub fn replace_note(&self, investor_id: i64, text: Option<&str>) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin note transaction")?;

        tx.execute("DELETE FROM notes WHERE investor_id = ?", params![investor_id])
            .context("Failed to delete previous note")?;

        if let Some(text) = text {
            let now = now_ts();
            tx.execute(
                "INSERT INTO notes (investor_id, note_text, created_at, updated_at)
                 VALUES (?, ?, ?, ?)",
                params![investor_id, text, now, now],
            )
            .context("Failed to insert note")?;
        }

        tx.commit().context("Failed to commit note")?;
        Ok(())
    }

    // ========================================================================
    // Logs
    // ========================================================================

    /// Append an audit row. Returns its id.
    pub fn insert_log(
        &self,
        action_type: &str,
        action_data: Option<&serde_json::Value>,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<i64> {
        let data = action_data
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to encode action_data")?;

        self.conn
            .execute(
                "INSERT INTO logs (action_type, action_data, user_agent, ip_address, created_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![action_type, data, user_agent, ip_address, now_ts()],
            )
            .context("Failed to insert log entry")?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List audit rows newest-first, optionally restricted to one action type.
    pub fn list_logs(
        &self,
        action_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LogEntry>> {
        let mut sql = String::from(
            "SELECT id, action_type, action_data, user_agent, ip_address, created_at FROM logs",
        );
        let mut param_values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(action_type) = action_type {
            sql.push_str(" WHERE action_type = ?");
            param_values.push(Box::new(action_type.to_string()));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));

        let params: Vec<&dyn rusqlite::ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare list_logs query")?;

        let rows = stmt
            .query_map(params.as_slice(), |row| {
                let data: Option<String> = row.get(2)?;
                Ok(LogEntry {
                    id: row.get(0)?,
                    action_type: row.get(1)?,
                    action_data: data.as_deref().map(decode_json_column),
                    user_agent: row.get(3)?,
                    ip_address: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .context("Failed to execute list_logs query")?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.context("Failed to read log row")?);
        }
        Ok(results)
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn flat_row_from(row: &Row<'_>) -> rusqlite::Result<FlatRow> {
    let portfolio: Option<String> = row.get(11)?;
    Ok(FlatRow {
        id: row.get(0)?,
        name: row.get(1)?,
        title: row.get(2)?,
        company: row.get(3)?,
        linkedin_url: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        location: row.get(7)?,
        industry: row.get(8)?,
        investment_stage: row.get(9)?,
        investment_size: row.get(10)?,
        portfolio_companies: portfolio.as_deref().map(decode_json_column),
        description: row.get(12)?,
        rating: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
        owner_name: row.get(16)?,
        stage: row.get(17)?,
        is_active: row.get(18)?,
        note_text: row.get(19)?,
    })
}

/// JSON columns written by other tools may hold plain text.
fn decode_json_column(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup() -> FunnelDb {
        let db = FunnelDb::open_in_memory().unwrap();
        db.init_schema().unwrap();
        db
    }

    fn add(db: &FunnelDb, name: &str) -> i64 {
        db.insert_investor_if_absent(&NewInvestor::named(name))
            .unwrap()
            .unwrap()
    }

    fn progress_rows(db: &FunnelDb, investor_id: i64, owner: Owner) -> i64 {
        db.conn()
            .query_row(
                "SELECT COUNT(*) FROM owner_progress WHERE investor_id = ? AND owner_name = ?",
                params![investor_id, owner],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_insert_if_absent_skips_duplicate_names() {
        let db = setup();
        assert!(db
            .insert_investor_if_absent(&NewInvestor::named("Ada"))
            .unwrap()
            .is_some());
        assert!(db
            .insert_investor_if_absent(&NewInvestor::named("Ada"))
            .unwrap()
            .is_none());
        assert_eq!(db.count_investors().unwrap(), 1);
    }

    #[test]
    fn test_flat_rows_left_join_fan_out() {
        let db = setup();
        let ada = add(&db, "Ada");
        let bob = add(&db, "Bob");

        db.replace_progress(ada, Owner::Anton, Some(Stage::MessageSent))
            .unwrap();
        db.replace_progress(ada, Owner::Pavel, Some(Stage::InviteSent))
            .unwrap();
        db.replace_note(ada, Some("warm intro")).unwrap();

        let rows = db.flat_rows().unwrap();
        // Ada: two progress rows, each joined with the note; Bob: one bare row
        assert_eq!(rows.len(), 3);
        assert!(rows[..2].iter().all(|r| r.id == ada));
        assert!(rows[..2]
            .iter()
            .all(|r| r.note_text.as_deref() == Some("warm intro")));
        assert_eq!(rows[2].id, bob);
        assert!(rows[2].owner_name.is_none());
        assert!(rows[2].stage.is_none());
        assert!(rows[2].note_text.is_none());
    }

    #[test]
    fn test_flat_rows_are_name_sorted() {
        let db = setup();
        add(&db, "Zed");
        add(&db, "Amy");
        add(&db, "Max");

        let names: Vec<String> = db.flat_rows().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Amy", "Max", "Zed"]);
    }

    #[test]
    fn test_replace_progress_keeps_single_row_per_owner() {
        let db = setup();
        let id = add(&db, "Ada");

        for stage in Stage::ALL {
            db.replace_progress(id, Owner::Anton, Some(stage)).unwrap();
            assert_eq!(progress_rows(&db, id, Owner::Anton), 1);
        }
        // Moving back to a previously used stage does not trip the unique constraint
        db.replace_progress(id, Owner::Anton, Some(Stage::InviteSent))
            .unwrap();
        assert_eq!(progress_rows(&db, id, Owner::Anton), 1);

        db.replace_progress(id, Owner::Anton, None).unwrap();
        assert_eq!(progress_rows(&db, id, Owner::Anton), 0);
    }

    #[test]
    fn test_replace_progress_does_not_touch_other_owner() {
        let db = setup();
        let id = add(&db, "Ada");

        db.replace_progress(id, Owner::Anton, Some(Stage::CallScheduled))
            .unwrap();
        db.replace_progress(id, Owner::Pavel, Some(Stage::Interested))
            .unwrap();
        db.replace_progress(id, Owner::Pavel, None).unwrap();

        let entries = db.progress_for(id).unwrap();
        assert_eq!(
            entries,
            vec![ProgressEntry::active(Owner::Anton, Stage::CallScheduled)]
        );
    }

    #[test]
    fn test_failed_insert_rolls_back_delete() {
        let db = setup();
        let id = add(&db, "Ada");
        db.replace_progress(id, Owner::Anton, Some(Stage::MessageSent))
            .unwrap();

        // Force the insert half to fail
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_insert BEFORE INSERT ON owner_progress
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let result = db.replace_progress(id, Owner::Anton, Some(Stage::Interested));
        assert!(result.is_err());

        // Never two stages for one owner; prior state survives the rollback
        let entries = db.progress_for(id).unwrap();
        assert_eq!(
            entries,
            vec![ProgressEntry::active(Owner::Anton, Stage::MessageSent)]
        );
    }

    #[test]
    fn test_replace_note() {
        let db = setup();
        let id = add(&db, "Ada");

        db.replace_note(id, Some("first")).unwrap();
        db.replace_note(id, Some("second")).unwrap();
        assert_eq!(db.note_for(id).unwrap().as_deref(), Some("second"));

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        db.replace_note(id, None).unwrap();
        assert_eq!(db.note_for(id).unwrap(), None);
    }

    #[test]
    fn test_logs_newest_first_with_filter_and_paging() {
        let db = setup();
        for i in 0..5 {
            db.insert_log("PROGRESS_UPDATE", Some(&json!({ "n": i })), None, None)
                .unwrap();
        }
        db.insert_log("NOTE_UPDATE", None, Some("agent/1.0"), Some("10.0.0.1"))
            .unwrap();

        let all = db.list_logs(None, 100, 0).unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].action_type, "NOTE_UPDATE");
        assert_eq!(all[0].user_agent.as_deref(), Some("agent/1.0"));

        let progress = db.list_logs(Some("PROGRESS_UPDATE"), 2, 1).unwrap();
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].action_data, Some(json!({ "n": 3 })));
        assert_eq!(progress[1].action_data, Some(json!({ "n": 2 })));
    }

    #[test]
    fn test_portfolio_companies_roundtrip_as_json() {
        let db = setup();
        let investor = NewInvestor {
            portfolio_companies: Some(json!(["Acme", "Globex"])),
            rating: 7,
            ..NewInvestor::named("Ada")
        };
        db.insert_investor_if_absent(&investor).unwrap();

        let rows = db.flat_rows().unwrap();
        assert_eq!(rows[0].portfolio_companies, Some(json!(["Acme", "Globex"])));
        assert_eq!(rows[0].rating, Some(7));
    }
}
