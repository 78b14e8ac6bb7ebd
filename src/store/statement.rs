//! Statements handed to a store
//!
//! A statement is rendered SQL text plus its ordered bind parameters. It also
//! keeps the logical read it was rendered from, which backends that do not
//! speak SQL evaluate instead of the text.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::planner::SearchFilter;
use crate::request::Pagination;

/// A bound parameter, referenced positionally as `$1`, `$2`, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(String),
    TextArray(Vec<String>),
    Int(i64),
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Text(s) => write!(f, "{:?}", s),
            SqlParam::TextArray(values) => write!(f, "{:?}", values),
            SqlParam::Int(n) => write!(f, "{}", n),
        }
    }
}

/// Which article count a statistics statement asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleCount {
    All,
    MissingAbstract,
    MissingPosted,
}

/// What a statement reads, independent of its SQL rendering
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalRead {
    /// Distinct matching articles for a search filter
    SearchCount(Arc<SearchFilter>),
    /// One page of ranked articles for a search filter
    SearchPage {
        filter: Arc<SearchFilter>,
        pagination: Pagination,
    },
    /// Distinct non-empty collections
    Categories,
    /// Ranked authors, overall or within one category
    AuthorRanks {
        category: Option<String>,
        limit: u32,
    },
    /// Download histogram buckets for one entity kind
    Distribution { category: String },
    /// A single summary value stored alongside the histogram
    DistributionValue { key: String },
    ArticleCount(ArticleCount),
    AuthorCount,
    /// Per-collection counts of articles not crawled within `days`
    OutdatedByCollection { days: u32 },
}

/// Rendered statement plus parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: Vec<SqlParam>,
    logical: LogicalRead,
}

impl Statement {
    pub fn new(text: impl Into<String>, params: Vec<SqlParam>, logical: LogicalRead) -> Self {
        Self {
            text: text.into(),
            params,
            logical,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn logical(&self) -> &LogicalRead {
        &self.logical
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
            write!(f, " -- params: [{}]", params.join(", "))?;
        }
        Ok(())
    }
}
