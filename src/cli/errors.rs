//! CLI-specific error types

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::engine::SearchError;
use crate::planner::PlannerError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Request rejected before reaching the database
    InvalidRequest,
    StoreUnavailable,
    StoreTimeout,
    /// Internal fault; the request itself was fine
    Internal,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "RX_CLI_CONFIG_ERROR",
            Self::IoError => "RX_CLI_IO_ERROR",
            Self::InvalidRequest => "RX_CLI_INVALID_REQUEST",
            Self::StoreUnavailable => "RX_CLI_STORE_UNAVAILABLE",
            Self::StoreTimeout => "RX_CLI_STORE_TIMEOUT",
            Self::Internal => "RX_CLI_INTERNAL",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<PlannerError> for CliError {
    fn from(e: PlannerError) -> Self {
        Self::new(CliErrorCode::Internal, e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::from(SearchError::from(e))
    }
}

impl From<SearchError> for CliError {
    fn from(e: SearchError) -> Self {
        let code = match &e {
            SearchError::Validation(_) => CliErrorCode::InvalidRequest,
            SearchError::StoreUnavailable(_) => CliErrorCode::StoreUnavailable,
            SearchError::StoreTimeout(_) => CliErrorCode::StoreTimeout,
            SearchError::Mapping(_) | SearchError::Store(_) => CliErrorCode::Internal,
        };
        Self::new(code, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ValidationError;

    #[test]
    fn test_search_error_codes() {
        let e = CliError::from(SearchError::from(ValidationError::invalid_metric("x")));
        assert_eq!(e.code(), CliErrorCode::InvalidRequest);

        let e = CliError::from(StoreError::Timeout("slow".into()));
        assert_eq!(e.code_str(), "RX_CLI_STORE_TIMEOUT");

        let e = CliError::from(StoreError::Unavailable("refused".into()));
        assert_eq!(e.code(), CliErrorCode::StoreUnavailable);
    }
}
