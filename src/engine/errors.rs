//! Errors surfaced by the engine and the catalog

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::executor::ExecutorError;
use crate::request::ValidationError;
use crate::store::StoreError;

/// Everything a search can fail with
#[derive(Debug, Error)]
pub enum SearchError {
    /// Rejected before any store call; retrying the same request is pointless
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store timed out: {0}")]
    StoreTimeout(String),

    /// Statement and row mapping disagree; an internal fault
    #[error("internal error: {0}")]
    Mapping(ExecutorError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl SearchError {
    /// True for failures a caller may retry with backoff or a larger deadline
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            SearchError::StoreUnavailable(_) | SearchError::StoreTimeout(_)
        )
    }

    /// Stable identifier for callers and logs
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Validation(_) => "validation",
            SearchError::StoreUnavailable(_) => "store_unavailable",
            SearchError::StoreTimeout(_) => "store_timeout",
            SearchError::Mapping(_) => "mapping",
            SearchError::Store(_) => "store",
        }
    }

    /// Emits the failure at the level its kind calls for
    pub(crate) fn log(&self) {
        match self {
            SearchError::Validation(e) => debug!(code = e.code().code(), "request rejected"),
            SearchError::StoreUnavailable(msg) => warn!(kind = self.kind(), %msg, "store unavailable"),
            SearchError::StoreTimeout(msg) => warn!(kind = self.kind(), %msg, "store timed out"),
            SearchError::Mapping(e) => error!(code = e.code().code(), error = %e, "row mapping failed"),
            SearchError::Store(e) => error!(error = %e, "store failure"),
        }
    }
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => SearchError::StoreUnavailable(msg),
            StoreError::Timeout(msg) => SearchError::StoreTimeout(msg),
            other => SearchError::Store(other),
        }
    }
}

impl From<ExecutorError> for SearchError {
    fn from(err: ExecutorError) -> Self {
        match err.store_error() {
            Some(store) => SearchError::from(store.clone()),
            None => SearchError::Mapping(err),
        }
    }
}

/// Result type for engine and catalog operations
pub type SearchResult<T> = Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_classified() {
        let e = SearchError::from(StoreError::Unavailable("pool timed out".into()));
        assert_eq!(e.kind(), "store_unavailable");
        assert!(e.is_retriable());

        let e = SearchError::from(StoreError::Timeout("canceling statement".into()));
        assert_eq!(e.kind(), "store_timeout");
        assert!(e.is_retriable());

        let e = SearchError::from(StoreError::Query("syntax error".into()));
        assert_eq!(e.kind(), "store");
        assert!(!e.is_retriable());
    }

    #[test]
    fn test_executor_errors_classified() {
        let e = SearchError::from(ExecutorError::store(StoreError::Timeout("slow".into())));
        assert!(matches!(e, SearchError::StoreTimeout(_)));

        let e = SearchError::from(ExecutorError::row_shape("page row", "expected 10 columns, got 2"));
        assert_eq!(e.kind(), "mapping");
        assert!(!e.is_retriable());
    }

    #[test]
    fn test_validation_not_retriable() {
        let e = SearchError::from(ValidationError::invalid_metric("citations"));
        assert_eq!(e.kind(), "validation");
        assert!(!e.is_retriable());
        assert!(e.to_string().contains("RX_INVALID_METRIC"));
    }
}
