//! Metric source resolution
//!
//! Maps each supported (metric, timeframe) pair to the ranking relation that
//! backs it. The mapping is a finite table checked for completeness when it
//! is built, so a missing pair is a startup failure rather than a request
//! that silently falls back to some default.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::request::{Metric, Timeframe, ValidationError, ValidationResult};

use super::errors::{PlannerError, PlannerResult};

/// Relation joined to `articles` to obtain the metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingRelation {
    AlltimeRanks,
    YtdRanks,
    MonthRanks,
    /// Per-day mention counts keyed by DOI
    CrossrefDaily,
}

impl RankingRelation {
    pub fn table_name(&self) -> &'static str {
        match self {
            RankingRelation::AlltimeRanks => "alltime_ranks",
            RankingRelation::YtdRanks => "ytd_ranks",
            RankingRelation::MonthRanks => "month_ranks",
            RankingRelation::CrossrefDaily => "crossref_daily",
        }
    }
}

/// Column pair linking the ranking relation to `articles`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKey {
    /// `r.article = a.id`
    ArticleId,
    /// `r.doi = a.doi`
    Doi,
}

impl JoinKey {
    pub fn on_clause(&self) -> &'static str {
        match self {
            JoinKey::ArticleId => "r.article = a.id",
            JoinKey::Doi => "r.doi = a.doi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Everything the assembler needs to know about a metric's backing data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSource {
    pub relation: RankingRelation,
    pub join: JoinKey,
    /// Projected metric value
    pub value_expr: &'static str,
    pub order_expr: &'static str,
    pub direction: SortDirection,
    /// Whether rows must be grouped per article before ordering
    pub aggregate: bool,
}

impl MetricSource {
    /// Precomputed download ranks: lower rank first, one row per article.
    /// Ties were already broken when the rank table was computed.
    pub const fn download_ranks(relation: RankingRelation) -> Self {
        Self {
            relation,
            join: JoinKey::ArticleId,
            value_expr: "r.downloads",
            order_expr: "r.rank",
            direction: SortDirection::Asc,
            aggregate: false,
        }
    }

    /// Daily mention rows summed per article, most-mentioned first
    pub const fn daily_mentions() -> Self {
        Self {
            relation: RankingRelation::CrossrefDaily,
            join: JoinKey::Doi,
            // SUM over bigint is numeric; the row decoder expects an integer
            value_expr: "SUM(r.count)::bigint",
            order_expr: "SUM(r.count)",
            direction: SortDirection::Desc,
            aggregate: true,
        }
    }

    /// `ORDER BY` body
    pub fn ordering(&self) -> String {
        format!("{} {}", self.order_expr, self.direction.as_sql())
    }
}

const STANDARD_SOURCES: [(Metric, Timeframe, MetricSource); 8] = [
    (
        Metric::Downloads,
        Timeframe::Alltime,
        MetricSource::download_ranks(RankingRelation::AlltimeRanks),
    ),
    (
        Metric::Downloads,
        Timeframe::Ytd,
        MetricSource::download_ranks(RankingRelation::YtdRanks),
    ),
    (
        Metric::Downloads,
        Timeframe::LastMonth,
        MetricSource::download_ranks(RankingRelation::MonthRanks),
    ),
    // The social window is a predicate on mention dates, not a separate table.
    (Metric::Social, Timeframe::Alltime, MetricSource::daily_mentions()),
    (Metric::Social, Timeframe::Day, MetricSource::daily_mentions()),
    (Metric::Social, Timeframe::Week, MetricSource::daily_mentions()),
    (Metric::Social, Timeframe::Month, MetricSource::daily_mentions()),
    (Metric::Social, Timeframe::Year, MetricSource::daily_mentions()),
];

/// Validated (metric, timeframe) → source mapping
#[derive(Debug, Clone)]
pub struct MetricSourceTable {
    entries: BTreeMap<(Metric, Timeframe), MetricSource>,
}

impl MetricSourceTable {
    /// The production mapping
    pub fn standard() -> PlannerResult<Self> {
        Self::from_entries(STANDARD_SOURCES)
    }

    /// Builds a table, requiring exactly one entry for every pair the
    /// request layer accepts and none for any other pair.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Metric, Timeframe, MetricSource)>,
    ) -> PlannerResult<Self> {
        let mut map = BTreeMap::new();
        for (metric, timeframe, source) in entries {
            if !metric.supports(timeframe) {
                return Err(PlannerError::source_table_conflict(format!(
                    "{}/{} is not a supported combination",
                    metric, timeframe
                )));
            }
            if map.insert((metric, timeframe), source).is_some() {
                return Err(PlannerError::source_table_conflict(format!(
                    "{}/{} is mapped more than once",
                    metric, timeframe
                )));
            }
        }

        for metric in Metric::ALL {
            for &timeframe in metric.timeframes() {
                if !map.contains_key(&(metric, timeframe)) {
                    return Err(PlannerError::source_table_incomplete(
                        metric.as_str(),
                        timeframe.as_str(),
                    ));
                }
            }
        }

        Ok(Self { entries: map })
    }

    pub fn resolve(&self, metric: Metric, timeframe: Timeframe) -> ValidationResult<&MetricSource> {
        self.entries.get(&(metric, timeframe)).ok_or_else(|| {
            ValidationError::metric_timeframe_mismatch(metric.as_str(), timeframe.as_str())
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
