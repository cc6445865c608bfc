//! Investor reads.

use crate::model::{FlatRow, Investor};
use crate::projection::group_rows;
use crate::store::FunnelDb;

use super::{CoreError, CoreResult};

/// Service for investor queries.
pub struct InvestorService<'a> {
    db: &'a FunnelDb,
}

impl<'a> InvestorService<'a> {
    pub(crate) const fn new(db: &'a FunnelDb) -> Self {
        Self { db }
    }

    /// Flat join rows, name-sorted. This is what `GET /api/investors` returns.
    pub fn flat(&self) -> CoreResult<Vec<FlatRow>> {
        self.db.flat_rows().map_err(CoreError::Internal)
    }

    /// Nested investors, one per id.
    pub fn list(&self) -> CoreResult<Vec<Investor>> {
        Ok(group_rows(self.flat()?))
    }

    /// Number of stored investors.
    pub fn count(&self) -> CoreResult<i64> {
        self.db.count_investors().map_err(CoreError::Internal)
    }

    /// Fail with `InvestorNotFound` unless the id exists.
    pub fn require(&self, investor_id: i64) -> CoreResult<()> {
        if self
            .db
            .investor_exists(investor_id)
            .map_err(CoreError::Internal)?
        {
            Ok(())
        } else {
            Err(CoreError::InvestorNotFound { investor_id })
        }
    }
}
