//! Predicate builder
//!
//! Describes the filters a request implies as abstract fragments. No SQL is
//! produced here; see the assembler for rendering.

use std::fmt;

use serde::Serialize;

use crate::request::{Metric, SearchRequest, Timeframe, ValidationError, ValidationResult};
use crate::store::SqlParam;

/// Full-text vectors searched by the text fragment, with their weights.
///
/// Title matches outrank abstract matches, which outrank author matches.
pub const TEXT_VECTORS: [(&str, char); 3] = [
    ("a.title_vector", 'A'),
    ("a.abstract_vector", 'C'),
    ("a.author_vector", 'D'),
];

/// Kind of filter. Declaration order is the canonical clause order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Text,
    PositiveDownloads,
    Category,
    TimeWindow,
}

impl PredicateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::Text => "text",
            PredicateKind::PositiveDownloads => "positive_downloads",
            PredicateKind::Category => "category",
            PredicateKind::TimeWindow => "time_window",
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named filter clause plus its parameter values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateFragment {
    kind: PredicateKind,
    params: Vec<SqlParam>,
}

impl PredicateFragment {
    /// Matches articles whose weighted text vector matches `query`
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            kind: PredicateKind::Text,
            params: vec![SqlParam::Text(query.into())],
        }
    }

    /// Matches articles whose collection is one of `categories`
    pub fn category(categories: &[String]) -> Self {
        Self {
            kind: PredicateKind::Category,
            params: vec![SqlParam::TextArray(categories.to_vec())],
        }
    }

    /// Excludes articles with no recorded downloads in the rank table
    pub fn positive_downloads() -> Self {
        Self {
            kind: PredicateKind::PositiveDownloads,
            params: Vec::new(),
        }
    }

    /// Keeps mention rows recorded within the last `days` days
    pub fn time_window(days: i64) -> Self {
        Self {
            kind: PredicateKind::TimeWindow,
            params: vec![SqlParam::Int(days)],
        }
    }

    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn query_text(&self) -> Option<&str> {
        match (self.kind, self.params.first()) {
            (PredicateKind::Text, Some(SqlParam::Text(q))) => Some(q),
            _ => None,
        }
    }

    pub fn categories(&self) -> Option<&[String]> {
        match (self.kind, self.params.first()) {
            (PredicateKind::Category, Some(SqlParam::TextArray(c))) => Some(c),
            _ => None,
        }
    }

    pub fn window_days(&self) -> Option<i64> {
        match (self.kind, self.params.first()) {
            (PredicateKind::TimeWindow, Some(SqlParam::Int(d))) => Some(*d),
            _ => None,
        }
    }
}

/// Lookback for a social-mention timeframe, in days.
///
/// `day` looks back two days.
pub fn lookback_days(timeframe: Timeframe) -> Option<i64> {
    match timeframe {
        Timeframe::Day => Some(2),
        Timeframe::Week => Some(7),
        Timeframe::Month => Some(30),
        Timeframe::Year => Some(365),
        Timeframe::Alltime | Timeframe::Ytd | Timeframe::LastMonth => None,
    }
}

/// Builds predicate fragments from a request
pub struct PredicateBuilder;

impl PredicateBuilder {
    /// Returns the request's fragments in canonical order.
    pub fn build(request: &SearchRequest) -> ValidationResult<Vec<PredicateFragment>> {
        let metric = request.metric();
        let timeframe = request.timeframe();
        if !metric.supports(timeframe) {
            return Err(ValidationError::metric_timeframe_mismatch(
                metric.as_str(),
                timeframe.as_str(),
            ));
        }

        let mut fragments = Vec::with_capacity(4);

        if !request.query().is_empty() {
            fragments.push(PredicateFragment::text(request.query()));
        }

        if !request.categories().is_empty() {
            fragments.push(PredicateFragment::category(request.categories()));
        }

        match metric {
            Metric::Downloads => fragments.push(PredicateFragment::positive_downloads()),
            Metric::Social if timeframe != Timeframe::Alltime => {
                let days = lookback_days(timeframe).ok_or_else(|| {
                    ValidationError::metric_timeframe_mismatch(metric.as_str(), timeframe.as_str())
                })?;
                fragments.push(PredicateFragment::time_window(days));
            }
            Metric::Social => {}
        }

        fragments.sort_by_key(PredicateFragment::kind);
        Ok(fragments)
    }
}
