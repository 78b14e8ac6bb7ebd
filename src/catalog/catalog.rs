//! Catalog operations

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, info_span, warn, Instrument};

use crate::config::EngineConfig;
use crate::engine::{SearchError, SearchResult};
use crate::executor::{extract_count, read_with_deadline, Deadline, ExecutorResult, RowReader};
use crate::request::ValidationError;
use crate::store::{ArticleCount, Row, Session, Store, Value};

use super::statements;
use super::types::{Distribution, DistributionBucket, RankedAuthor, SiteStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOptions {
    pub statement_timeout: Duration,
    /// Rows returned by author rankings
    pub author_ranks_limit: u32,
    /// Age in days after which an article counts as outdated
    pub outdated_days: u32,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            statement_timeout: Duration::from_secs(10),
            author_ranks_limit: 200,
            outdated_days: 7,
        }
    }
}

impl CatalogOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            statement_timeout: config.statement_timeout(),
            author_ranks_limit: config.author_ranks_limit,
            outdated_days: config.outdated_limit_days,
        }
    }
}

/// Site-level read paths
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    options: CatalogOptions,
}

impl Catalog {
    pub fn new(options: CatalogOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    /// Distinct non-empty collections, ascending
    pub async fn categories<S: Store>(&self, store: &S) -> SearchResult<Vec<String>> {
        logged(
            self.read_categories(store)
                .instrument(info_span!("catalog", op = "categories")),
        )
        .await
    }

    /// Top authors by downloads. A missing or blank category ranks across
    /// all collections.
    pub async fn author_rankings<S: Store>(
        &self,
        store: &S,
        category: Option<&str>,
    ) -> SearchResult<Vec<RankedAuthor>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        logged(
            self.read_author_rankings(store, category)
                .instrument(info_span!("catalog", op = "author_rankings", category)),
        )
        .await
    }

    /// Histogram plus mean and median for `paper` or `author`
    pub async fn download_distribution<S: Store>(
        &self,
        store: &S,
        kind: &str,
    ) -> SearchResult<Distribution> {
        if !statements::DISTRIBUTION_KINDS.contains(&kind) {
            let err = SearchError::from(ValidationError::invalid_category(kind));
            err.log();
            return Err(err);
        }
        logged(
            self.read_distribution(store, kind)
                .instrument(info_span!("catalog", op = "download_distribution", kind)),
        )
        .await
    }

    /// Indexing statistics, all read from one snapshot
    pub async fn site_stats<S: Store>(&self, store: &S) -> SearchResult<SiteStats> {
        logged(
            self.read_site_stats(store)
                .instrument(info_span!("catalog", op = "site_stats")),
        )
        .await
    }

    /// Statement timeout plus a budget of the same length for the whole call
    fn deadline(&self) -> (Duration, Deadline) {
        let timeout = self.options.statement_timeout;
        (timeout, Deadline::after(timeout))
    }

    async fn read_categories<S: Store>(&self, store: &S) -> SearchResult<Vec<String>> {
        let (timeout, deadline) = self.deadline();
        let mut session = deadline.run("snapshot", store.snapshot(timeout)).await?;
        let rows = read_with_deadline(&mut session, &statements::categories(), &deadline).await?;
        finish(session).await;

        let mut categories = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(name) = RowReader::expect(row, 1, "category row")?.opt_text(0)? {
                categories.push(name);
            }
        }
        Ok(categories)
    }

    async fn read_author_rankings<S: Store>(
        &self,
        store: &S,
        category: Option<&str>,
    ) -> SearchResult<Vec<RankedAuthor>> {
        let (timeout, deadline) = self.deadline();
        let statement = statements::author_ranks(category, self.options.author_ranks_limit);
        let mut session = deadline.run("snapshot", store.snapshot(timeout)).await?;
        let rows = read_with_deadline(&mut session, &statement, &deadline).await?;
        finish(session).await;

        let authors = rows
            .iter()
            .map(ranked_author)
            .collect::<ExecutorResult<Vec<_>>>()?;
        debug!(returned = authors.len(), "author rankings read");
        Ok(authors)
    }

    async fn read_distribution<S: Store>(&self, store: &S, kind: &str) -> SearchResult<Distribution> {
        let (timeout, deadline) = self.deadline();
        let mut session = deadline.run("snapshot", store.snapshot(timeout)).await?;
        let rows = read_with_deadline(&mut session, &statements::distribution(kind), &deadline).await?;
        let mean = read_with_deadline(
            &mut session,
            &statements::distribution_value(&format!("{}_mean", kind)),
            &deadline,
        )
        .await?;
        let median = read_with_deadline(
            &mut session,
            &statements::distribution_value(&format!("{}_median", kind)),
            &deadline,
        )
        .await?;
        finish(session).await;

        let buckets = rows
            .iter()
            .map(|row| {
                let r = RowReader::expect(row, 2, "distribution row")?;
                Ok(DistributionBucket {
                    bucket: r.int(0)?,
                    count: r.int(1)?,
                })
            })
            .collect::<ExecutorResult<Vec<_>>>()?;

        Ok(Distribution {
            kind: kind.to_string(),
            buckets,
            mean: summary_value(&mean),
            median: summary_value(&median),
        })
    }

    async fn read_site_stats<S: Store>(&self, store: &S) -> SearchResult<SiteStats> {
        let (timeout, deadline) = self.deadline();
        let mut session = deadline.run("snapshot", store.snapshot(timeout)).await?;

        let mut counts = [0u64; 4];
        let count_statements = [
            statements::article_count(ArticleCount::All),
            statements::author_count(),
            statements::article_count(ArticleCount::MissingAbstract),
            statements::article_count(ArticleCount::MissingPosted),
        ];
        for (slot, statement) in counts.iter_mut().zip(count_statements.iter()) {
            *slot = extract_count(&read_with_deadline(&mut session, statement, &deadline).await?);
        }
        let outdated = read_with_deadline(
            &mut session,
            &statements::outdated_by_collection(self.options.outdated_days),
            &deadline,
        )
        .await?;
        finish(session).await;

        let [papers_indexed, authors_indexed, missing_abstract, missing_date] = counts;
        Ok(SiteStats {
            papers_indexed,
            authors_indexed,
            missing_abstract,
            missing_date,
            outdated_count: outdated_counts(&outdated),
        })
    }
}

async fn logged<T>(op: impl Future<Output = SearchResult<T>>) -> SearchResult<T> {
    let outcome = op.await;
    if let Err(e) = &outcome {
        e.log();
    }
    outcome
}

async fn finish<S: Session>(session: S) {
    if let Err(e) = session.finish().await {
        warn!(error = %e, "failed to end snapshot");
    }
}

fn ranked_author(row: &Row) -> ExecutorResult<RankedAuthor> {
    let r = RowReader::expect(row, 5, "author rank row")?;
    Ok(RankedAuthor {
        id: r.int(0)?,
        name: r.opt_text(1)?.unwrap_or_default(),
        rank: r.int(2)?,
        downloads: r.opt_int(3)?.unwrap_or(0),
        tie: r.opt_bool(4)?.unwrap_or(false),
    })
}

/// Missing summary rows read as zero
fn summary_value(rows: &[Row]) -> f64 {
    match rows.first().and_then(|row| row.get(0)) {
        Some(Value::Int(n)) => *n as f64,
        Some(Value::Float(f)) => *f,
        _ => 0.0,
    }
}

/// Rows without a collection name or a count are skipped
fn outdated_counts(rows: &[Row]) -> BTreeMap<String, u64> {
    rows.iter()
        .filter_map(|row| {
            let collection = row.get(0)?.as_str()?;
            let count = row.get(1)?.as_i64()?;
            Some((collection.to_string(), u64::try_from(count).unwrap_or(0)))
        })
        .collect()
}
