//! Executor error types
//!
//! Error codes:
//! - RX_STORE_FAILURE (ERROR)
//! - RX_ROW_SHAPE_MISMATCH (FATAL)
//! - RX_INCONSISTENT_TOTAL (FATAL)

use std::fmt;

use crate::store::StoreError;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed but the system is healthy
    Error,
    /// Internal contract violated
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// The store failed a read
    StoreFailure,
    /// A row does not match the statement's projection
    RowShapeMismatch,
    /// The count disagrees with the page read in the same snapshot
    InconsistentTotal,
}

impl ExecutorErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::StoreFailure => "RX_STORE_FAILURE",
            ExecutorErrorCode::RowShapeMismatch => "RX_ROW_SHAPE_MISMATCH",
            ExecutorErrorCode::InconsistentTotal => "RX_INCONSISTENT_TOTAL",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ExecutorErrorCode::StoreFailure => Severity::Error,
            ExecutorErrorCode::RowShapeMismatch | ExecutorErrorCode::InconsistentTotal => {
                Severity::Fatal
            }
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    store: Option<StoreError>,
}

impl ExecutorError {
    pub fn store(err: StoreError) -> Self {
        Self {
            code: ExecutorErrorCode::StoreFailure,
            message: err.to_string(),
            store: Some(err),
        }
    }

    pub fn row_shape(context: &str, reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::RowShapeMismatch,
            message: format!("{}: {}", context, reason.into()),
            store: None,
        }
    }

    pub fn inconsistent_total(total: u64, offset: u64, returned: usize) -> Self {
        Self {
            code: ExecutorErrorCode::InconsistentTotal,
            message: format!(
                "total {} cannot hold {} rows at offset {}",
                total, returned, offset
            ),
            store: None,
        }
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying store error, for store failures
    pub fn store_error(&self) -> Option<&StoreError> {
        self.store.as_ref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.store
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<StoreError> for ExecutorError {
    fn from(err: StoreError) -> Self {
        Self::store(err)
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
