//! Typed error types for the funnel-core service layer.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for core service operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the funnel-core service layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An investor was not found.
    #[error("Investor not found: {investor_id}")]
    InvestorNotFound { investor_id: i64 },

    /// A caller supplied a value the service cannot act on.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// No pooled connection became free before the acquire timeout.
    #[error("Timed out after {waited:?} waiting for a database connection")]
    PoolTimeout { waited: Duration },

    /// Seed data could not be imported.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// An internal storage or database error.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Failures while reading a seed file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The seed file does not exist.
    #[error("Data file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// The seed file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The seed file is not a JSON array of records.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The seed file parsed but held no records.
    #[error("No records in {}", path.display())]
    Empty { path: PathBuf },
}
