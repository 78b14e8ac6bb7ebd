//! Request validation errors
//!
//! Error codes:
//! - RX_INVALID_METRIC (REJECT)
//! - RX_INVALID_TIMEFRAME (REJECT)
//! - RX_METRIC_TIMEFRAME_MISMATCH (REJECT)
//! - RX_INVALID_PAGINATION (REJECT)
//! - RX_INVALID_CATEGORY (REJECT)

use std::fmt;

/// Validation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// Metric is not one of the supported ranking statistics
    InvalidMetric,
    /// Timeframe is not a known window
    InvalidTimeframe,
    /// Timeframe is known but not offered for the chosen metric
    MetricTimeframeMismatch,
    /// Page size out of bounds or offset overflow
    InvalidPagination,
    /// Unknown distribution category
    InvalidCategory,
}

impl ValidationErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationErrorCode::InvalidMetric => "RX_INVALID_METRIC",
            ValidationErrorCode::InvalidTimeframe => "RX_INVALID_TIMEFRAME",
            ValidationErrorCode::MetricTimeframeMismatch => "RX_METRIC_TIMEFRAME_MISMATCH",
            ValidationErrorCode::InvalidPagination => "RX_INVALID_PAGINATION",
            ValidationErrorCode::InvalidCategory => "RX_INVALID_CATEGORY",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A rejected request, with the offending field when there is one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    code: ValidationErrorCode,
    message: String,
    field: Option<&'static str>,
}

impl ValidationError {
    pub fn invalid_metric(value: impl Into<String>) -> Self {
        Self {
            code: ValidationErrorCode::InvalidMetric,
            message: format!("Unsupported metric '{}'", value.into()),
            field: Some("metric"),
        }
    }

    pub fn invalid_timeframe(value: impl Into<String>) -> Self {
        Self {
            code: ValidationErrorCode::InvalidTimeframe,
            message: format!("Unsupported timeframe '{}'", value.into()),
            field: Some("timeframe"),
        }
    }

    pub fn metric_timeframe_mismatch(metric: &str, timeframe: &str) -> Self {
        Self {
            code: ValidationErrorCode::MetricTimeframeMismatch,
            message: format!(
                "Timeframe '{}' is not available for metric '{}'",
                timeframe, metric
            ),
            field: Some("timeframe"),
        }
    }

    pub fn invalid_pagination(reason: impl Into<String>) -> Self {
        Self {
            code: ValidationErrorCode::InvalidPagination,
            message: reason.into(),
            field: Some("page_size"),
        }
    }

    pub fn invalid_category(value: impl Into<String>) -> Self {
        Self {
            code: ValidationErrorCode::InvalidCategory,
            message: format!("Unsupported category '{}'", value.into()),
            field: Some("category"),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ValidationErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the rejected field, if known
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Result type for request validation
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ValidationErrorCode::InvalidMetric.code(), "RX_INVALID_METRIC");
        assert_eq!(
            ValidationErrorCode::MetricTimeframeMismatch.code(),
            "RX_METRIC_TIMEFRAME_MISMATCH"
        );
        assert_eq!(
            ValidationErrorCode::InvalidPagination.code(),
            "RX_INVALID_PAGINATION"
        );
    }

    #[test]
    fn test_display_names_code_and_value() {
        let err = ValidationError::invalid_metric("citations");
        let display = err.to_string();
        assert!(display.starts_with("[REJECT] RX_INVALID_METRIC"));
        assert!(display.contains("citations"));
        assert_eq!(err.field(), Some("metric"));
    }
}
