//! Error types for ledger engine operations.
//!
//! Errors are descriptive at the core level; the CLI layer decides which of
//! them are fatal for the process.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Core error type for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Entity or transaction id absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transaction id already present in the ledger (or repeated in a batch)
    #[error("Duplicate transaction id: {0}")]
    DuplicateId(i64),

    /// A context path step matched nothing
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// A context path or value does not fit the container shape
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A unique selection matched more than one target
    #[error("Ambiguous path: {path} matched {matches} targets")]
    AmbiguousPath { path: String, matches: usize },

    /// Transient infrastructure fault; callers own the retry policy
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LedgerError {
    /// Whether the error is a transient backend fault.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::StoreUnavailable(_))
    }

    /// Whether the error reports a missing entity or id.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy)
            | Some(ErrorCode::DatabaseLocked)
            | Some(ErrorCode::CannotOpen) => LedgerError::StoreUnavailable(err.to_string()),
            _ => LedgerError::Storage(format!("SQLite error: {}", err)),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Storage(format!("Invalid record payload: {}", err))
    }
}
