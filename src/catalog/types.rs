//! Catalog result types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of an author ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedAuthor {
    pub id: i64,
    pub name: String,
    pub rank: i64,
    pub downloads: i64,
    /// Shares its rank with another author
    pub tie: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionBucket {
    pub bucket: i64,
    pub count: i64,
}

/// Download histogram for papers or authors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub kind: String,
    pub buckets: Vec<DistributionBucket>,
    pub mean: f64,
    pub median: f64,
}

/// Summary of what has been indexed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStats {
    pub papers_indexed: u64,
    pub authors_indexed: u64,
    pub missing_abstract: u64,
    pub missing_date: u64,
    /// Articles per collection not crawled within the outdated limit
    pub outdated_count: BTreeMap<String, u64>,
}
