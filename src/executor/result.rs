//! Search result types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::Row;

use super::errors::ExecutorResult;
use super::reader::RowReader;

/// One ranked preprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: i64,
    pub url: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub collection: Option<String>,
    pub origin_month: Option<i64>,
    pub origin_year: Option<i64>,
    pub posted: Option<NaiveDate>,
    pub doi: Option<String>,
    /// Downloads or mention count, depending on the metric
    pub metric_value: i64,
}

impl RankedResult {
    /// Maps a page row: metric value first, then the display columns
    pub fn from_row(row: &Row, arity: usize) -> ExecutorResult<Self> {
        let r = RowReader::expect(row, arity, "page row")?;
        Ok(Self {
            metric_value: r.opt_int(0)?.unwrap_or(0),
            id: r.int(1)?,
            url: r.opt_text(2)?,
            title: r.opt_text(3)?,
            abstract_text: r.opt_text(4)?,
            collection: r.opt_text(5)?,
            origin_month: r.opt_int(6)?,
            origin_year: r.opt_int(7)?,
            posted: r.opt_date(8)?,
            doi: r.opt_text(9)?,
        })
    }
}

/// One page of results plus the size of the whole result set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub results: Vec<RankedResult>,
    pub total: u64,
}

impl ResultPage {
    pub fn new(results: Vec<RankedResult>, total: u64) -> Self {
        Self { results, total }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
