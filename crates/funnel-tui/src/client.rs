//! Transport abstraction between the dashboard and the funnel store.

use anyhow::Result;

use funnel_core::api::{NewLogEntry, NoteUpdate, ProgressUpdate};
use funnel_core::model::{FlatRow, Investor};
use funnel_core::projection::group_rows;

/// Operations the dashboard needs from a funnel backend.
///
/// Implemented over HTTP ([`crate::HttpClient`]) and in-process against the
/// database ([`crate::LocalClient`]).
pub trait FunnelClient {
    /// The flat investor join, name-sorted.
    fn fetch_rows(&self) -> Result<Vec<FlatRow>>;

    fn save_progress(&self, update: &ProgressUpdate) -> Result<()>;

    fn save_note(&self, update: &NoteUpdate) -> Result<()>;

    /// Record a client-side action. Callers ignore failures.
    fn log_action(&self, entry: &NewLogEntry) -> Result<()>;

    /// Fetch and project into nested investors.
    fn fetch_investors(&self) -> Result<Vec<Investor>> {
        Ok(group_rows(self.fetch_rows()?))
    }
}
