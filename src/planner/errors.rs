//! Planner error types
//!
//! Error codes:
//! - RX_SOURCE_TABLE_INCOMPLETE (FATAL)
//! - RX_SOURCE_TABLE_CONFLICT (FATAL)
//!
//! Both are raised while building the metric source table at startup, never
//! while serving a request.

use std::fmt;

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// A supported (metric, timeframe) pair has no source
    SourceTableIncomplete,
    /// A pair is mapped twice, or an unsupported pair is mapped
    SourceTableConflict,
}

impl PlannerErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::SourceTableIncomplete => "RX_SOURCE_TABLE_INCOMPLETE",
            PlannerErrorCode::SourceTableConflict => "RX_SOURCE_TABLE_CONFLICT",
        }
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
}

impl PlannerError {
    pub fn source_table_incomplete(metric: &str, timeframe: &str) -> Self {
        Self {
            code: PlannerErrorCode::SourceTableIncomplete,
            message: format!("No ranking source for {}/{}", metric, timeframe),
        }
    }

    pub fn source_table_conflict(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::SourceTableConflict,
            message: reason.into(),
        }
    }

    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
