//! Explain output
//!
//! Deterministic, human-readable description of what a search would run.

use std::fmt;

use serde::Serialize;

use crate::request::ValidationError;

use super::assembler::AssembledQuery;

/// Explain plan output
#[derive(Debug, Clone, Serialize)]
pub struct ExplainPlan {
    /// Whether the request was accepted
    pub accepted: bool,
    /// Fragment kinds, canonical order
    pub predicates: Vec<String>,
    /// Backing ranking relation
    pub source: Option<String>,
    pub ordering: Option<String>,
    pub grouped: bool,
    pub count_sql: Option<String>,
    pub page_sql: Option<String>,
    pub params: Vec<String>,
    pub rejection_reason: Option<String>,
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    pub fn from_query(query: &AssembledQuery) -> Self {
        let source = query.filter().source();
        Self {
            accepted: true,
            predicates: query
                .filter()
                .fragments()
                .iter()
                .map(|f| f.kind().as_str().to_string())
                .collect(),
            source: Some(source.relation.table_name().to_string()),
            ordering: Some(source.ordering()),
            grouped: source.aggregate,
            count_sql: Some(query.count().text().to_string()),
            page_sql: Some(query.page().text().to_string()),
            params: query.params().iter().map(ToString::to_string).collect(),
            rejection_reason: None,
            rejection_code: None,
        }
    }

    pub fn from_error(error: &ValidationError) -> Self {
        Self {
            accepted: false,
            predicates: Vec::new(),
            source: None,
            ordering: None,
            grouped: false,
            count_sql: None,
            page_sql: None,
            params: Vec::new(),
            rejection_reason: Some(error.message().to_string()),
            rejection_code: Some(error.code().code().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.accepted {
            writeln!(f, "REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "  code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "  reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "ACCEPTED")?;
        if let Some(source) = &self.source {
            writeln!(f, "  source: {}", source)?;
        }
        if self.predicates.is_empty() {
            writeln!(f, "  predicates: (none)")?;
        } else {
            writeln!(f, "  predicates: {}", self.predicates.join(" AND "))?;
        }
        if let Some(ordering) = &self.ordering {
            writeln!(f, "  ordering: {}", ordering)?;
        }
        writeln!(f, "  grouped: {}", self.grouped)?;
        if let Some(sql) = &self.count_sql {
            writeln!(f, "  count: {}", sql)?;
        }
        if let Some(sql) = &self.page_sql {
            writeln!(f, "  page: {}", sql)?;
        }
        if !self.params.is_empty() {
            writeln!(f, "  params: [{}]", self.params.join(", "))?;
        }
        Ok(())
    }
}
