//! Store error kinds

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store failures, classified by what a caller can do about them
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Connection or session could not be acquired
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A statement exceeded its deadline
    #[error("statement timed out: {0}")]
    Timeout(String),

    /// The store rejected or failed a statement
    #[error("statement failed: {0}")]
    Query(String),

    /// A returned value could not be decoded into a row value
    #[error("could not decode row: {0}")]
    Decode(String),
}

impl StoreError {
    /// Unavailability and timeouts may succeed when retried
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }

    /// Classifies an sqlx error.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // query_canceled: raised when statement_timeout fires
                Some("57014") => StoreError::Timeout(db.message().to_string()),
                // class 08: connection exception
                Some(code) if code.starts_with("08") => {
                    StoreError::Unavailable(db.message().to_string())
                }
                _ => StoreError::Query(err.to_string()),
            },
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => StoreError::Decode(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}
