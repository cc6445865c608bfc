//! Pool of SQLite connections, managed by `r2d2`.
//!
//! A checked-out connection is a [`PooledDb`], which derefs to [`FunnelDb`]
//! and hands the connection back on drop, so every exit path (early return,
//! `?`, panic unwinding) releases it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::ManageConnection;
use tracing::debug;

use super::FunnelDb;
use crate::core::{CoreError, CoreResult};

/// Default time a caller waits for a free connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// A checked-out connection. Returned to the pool on drop.
pub type PooledDb = r2d2::PooledConnection<FunnelConnectionManager>;

/// Opens configured [`FunnelDb`] connections for `r2d2`.
#[derive(Debug)]
pub struct FunnelConnectionManager {
    path: PathBuf,
}

impl ManageConnection for FunnelConnectionManager {
    type Connection = FunnelDb;
    type Error = rusqlite::Error;

    fn connect(&self) -> Result<FunnelDb, rusqlite::Error> {
        FunnelDb::connect(&self.path)
    }

    fn is_valid(&self, db: &mut FunnelDb) -> Result<(), rusqlite::Error> {
        db.conn().execute_batch("")
    }

    fn has_broken(&self, _db: &mut FunnelDb) -> bool {
        false
    }
}

/// Shared handle to the pool. Cheap to clone.
#[derive(Clone)]
pub struct DbPool {
    inner: r2d2::Pool<FunnelConnectionManager>,
    timeout: Duration,
}

impl DbPool {
    /// Open a pool of at most `size` connections over the database at `path`.
    ///
    /// One connection is opened up front to create parent directories and the
    /// schema, so a bad path fails here rather than on first use.
    pub fn open(path: &Path, size: usize, timeout: Duration) -> CoreResult<Self> {
        let max_size = u32::try_from(size)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| CoreError::invalid("pool size must be between 1 and u32::MAX"))?;

        FunnelDb::open(path)?.init_schema()?;

        let inner = r2d2::Pool::builder()
            .max_size(max_size)
            .min_idle(Some(1))
            .connection_timeout(timeout)
            .build(FunnelConnectionManager {
                path: path.to_path_buf(),
            })
            .map_err(|err| anyhow::anyhow!("Failed to build connection pool: {err}"))?;

        debug!(path = %path.display(), size, "opened connection pool");
        Ok(Self { inner, timeout })
    }

    /// Check out a connection, waiting up to the pool's timeout.
    pub fn get(&self) -> CoreResult<PooledDb> {
        // r2d2 only fails a checkout once its connection timeout has elapsed
        self.inner.get().map_err(|err| {
            debug!(error = %err, "connection checkout timed out");
            CoreError::PoolTimeout {
                waited: self.timeout,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::thread;
    use tempfile::tempdir;

    fn pool(size: usize, timeout: Duration) -> (tempfile::TempDir, DbPool) {
        let dir = tempdir().unwrap();
        let pool = DbPool::open(&dir.path().join("funnel.db"), size, timeout).unwrap();
        (dir, pool)
    }

    fn idle(pool: &DbPool) -> u32 {
        pool.inner.state().idle_connections
    }

    #[test]
    fn test_zero_size_rejected() {
        let dir = tempdir().unwrap();
        let result = DbPool::open(&dir.path().join("funnel.db"), 0, DEFAULT_ACQUIRE_TIMEOUT);
        assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
    }

    #[test]
    fn test_open_creates_schema_in_nested_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("funnel.db");
        let pool = DbPool::open(&path, 2, DEFAULT_ACQUIRE_TIMEOUT).unwrap();
        assert_eq!(pool.get().unwrap().count_investors().unwrap(), 0);
    }

    #[test]
    fn test_timeout_when_exhausted() {
        let (_dir, pool) = pool(1, Duration::from_millis(50));
        let _held = pool.get().unwrap();

        let result = pool.get();
        assert!(matches!(
            result,
            Err(CoreError::PoolTimeout { waited }) if waited == Duration::from_millis(50)
        ));
    }

    #[test]
    fn test_connection_returned_on_error_path() {
        let (_dir, pool) = pool(1, Duration::from_millis(200));

        let failing = || -> CoreResult<()> {
            let db = pool.get()?;
            db.conn()
                .execute("INSERT INTO no_such_table VALUES (1)", [])
                .context("expected failure")?;
            Ok(())
        };
        assert!(failing().is_err());

        // The single connection is available again
        assert_eq!(idle(&pool), 1);
        assert!(pool.get().is_ok());
    }

    #[test]
    fn test_connection_returned_after_panic() {
        let (_dir, pool) = pool(1, Duration::from_millis(200));

        let cloned = pool.clone();
        let joined = thread::spawn(move || {
            let _db = cloned.get().unwrap();
            panic!("boom");
        })
        .join();
        assert!(joined.is_err());

        assert!(pool.get().is_ok());
    }

    #[test]
    fn test_waiter_wakes_when_connection_released() {
        let (_dir, pool) = pool(1, Duration::from_secs(5));
        let held = pool.get().unwrap();

        let cloned = pool.clone();
        let waiter = thread::spawn(move || cloned.get().map(|_| ()));

        thread::sleep(Duration::from_millis(50));
        drop(held);

        assert!(waiter.join().unwrap().is_ok());
    }

    #[test]
    fn test_pooled_connections_share_data() {
        let (_dir, pool) = pool(2, DEFAULT_ACQUIRE_TIMEOUT);
        let a = pool.get().unwrap();
        let b = pool.get().unwrap();

        a.insert_investor_if_absent(&crate::model::NewInvestor::named("Ada"))
            .unwrap();
        assert_eq!(b.count_investors().unwrap(), 1);
    }
}
