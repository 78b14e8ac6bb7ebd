//! In-memory store
//!
//! Tables live behind an `Arc` that writers replace copy-on-write. A session
//! clones the `Arc` when it opens, so it keeps reading the version it started
//! with no matter what is written afterwards.
//!
//! Statements are evaluated from their logical read, not their SQL text.
//! Text matching follows `plainto_tsquery`: every query term must occur in
//! the title, abstract or author names (case-insensitive, no stemming).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::planner::{PredicateFragment, PredicateKind, RankingRelation, SearchFilter, SortDirection};
use crate::request::Pagination;

use super::errors::{StoreError, StoreResult};
use super::row::{Row, Value};
use super::statement::{ArticleCount, LogicalRead, Statement};
use super::{Session, Store, StoreFuture};

/// One row of `articles`
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub id: i64,
    pub url: Option<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    pub collection: Option<String>,
    pub origin_month: Option<i64>,
    pub origin_year: Option<i64>,
    pub posted: Option<NaiveDate>,
    /// Author names, searched as the lowest-weight text vector
    pub authors: Vec<String>,
    pub last_crawled: NaiveDate,
}

impl ArticleRecord {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            url: None,
            title: title.into(),
            abstract_text: None,
            doi: None,
            collection: None,
            origin_month: None,
            origin_year: None,
            posted: None,
            authors: Vec::new(),
            last_crawled: NaiveDate::default(),
        }
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_posted(mut self, posted: NaiveDate) -> Self {
        self.origin_month = Some(i64::from(chrono::Datelike::month(&posted)));
        self.origin_year = Some(i64::from(chrono::Datelike::year(&posted)));
        self.posted = Some(posted);
        self
    }

    pub fn with_last_crawled(mut self, date: NaiveDate) -> Self {
        self.last_crawled = date;
        self
    }
}

/// One row of a download rank table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankRecord {
    pub article: i64,
    pub rank: i64,
    pub downloads: i64,
}

/// One day of mentions for one DOI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionRecord {
    pub doi: String,
    pub count: i64,
    pub source_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub id: i64,
    pub name: String,
}

/// Author rank, overall when `category` is `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRankRecord {
    pub author: i64,
    pub category: Option<String>,
    pub rank: i64,
    pub downloads: i64,
    pub tie: bool,
}

/// One histogram bucket, or a summary value when `category` is
/// `<kind>_mean` / `<kind>_median`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionRecord {
    pub category: String,
    pub bucket: i64,
    pub count: i64,
}

/// Every table the engine reads
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    pub articles: BTreeMap<i64, ArticleRecord>,
    pub ranks: BTreeMap<RankingRelation, Vec<RankRecord>>,
    pub mentions: Vec<MentionRecord>,
    pub authors: BTreeMap<i64, AuthorRecord>,
    pub author_ranks: Vec<AuthorRankRecord>,
    pub distribution: Vec<DistributionRecord>,
}

#[derive(Debug, Default)]
struct MemoryStats {
    snapshots: AtomicUsize,
    reads: AtomicUsize,
    open_sessions: AtomicUsize,
}

/// Decrements the open-session count when the session goes away
#[derive(Debug)]
struct SessionLease(Arc<MemoryStats>);

impl SessionLease {
    fn acquire(stats: &Arc<MemoryStats>) -> Self {
        stats.open_sessions.fetch_add(1, Ordering::SeqCst);
        stats.snapshots.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(stats))
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.0.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory store with a fixed clock
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Arc<MemoryTables>>,
    now: DateTime<Utc>,
    latency_ms: AtomicU64,
    unavailable: AtomicBool,
    stats: Arc<MemoryStats>,
}

impl MemoryStore {
    /// Creates an empty store whose `now()` is fixed at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_tables(now, MemoryTables::default())
    }

    pub fn with_tables(now: DateTime<Utc>, tables: MemoryTables) -> Self {
        Self {
            tables: RwLock::new(Arc::new(tables)),
            now,
            latency_ms: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
            stats: Arc::new(MemoryStats::default()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Applies a write. Open sessions keep their old version.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut MemoryTables),
    {
        let mut guard = self.tables.write().unwrap_or_else(|e| e.into_inner());
        f(Arc::make_mut(&mut *guard));
    }

    pub fn insert_article(&self, article: ArticleRecord) {
        self.update(|t| {
            t.articles.insert(article.id, article);
        });
    }

    pub fn insert_rank(&self, relation: RankingRelation, rank: RankRecord) {
        self.update(|t| t.ranks.entry(relation).or_default().push(rank));
    }

    pub fn insert_mention(&self, doi: impl Into<String>, count: i64, source_date: NaiveDate) {
        let mention = MentionRecord {
            doi: doi.into(),
            count,
            source_date,
        };
        self.update(|t| t.mentions.push(mention));
    }

    pub fn insert_author(&self, id: i64, name: impl Into<String>) {
        let author = AuthorRecord {
            id,
            name: name.into(),
        };
        self.update(|t| {
            t.authors.insert(id, author);
        });
    }

    pub fn insert_author_rank(&self, rank: AuthorRankRecord) {
        self.update(|t| t.author_ranks.push(rank));
    }

    pub fn insert_distribution(&self, category: impl Into<String>, bucket: i64, count: i64) {
        let record = DistributionRecord {
            category: category.into(),
            bucket,
            count,
        };
        self.update(|t| t.distribution.push(record));
    }

    /// Delay applied to every read
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// When set, `snapshot` fails as if no connection could be acquired
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Statements read so far, across all sessions
    pub fn reads(&self) -> usize {
        self.stats.reads.load(Ordering::SeqCst)
    }

    /// Sessions opened so far
    pub fn snapshots(&self) -> usize {
        self.stats.snapshots.load(Ordering::SeqCst)
    }

    /// Sessions currently holding a "connection"
    pub fn open_sessions(&self) -> usize {
        self.stats.open_sessions.load(Ordering::SeqCst)
    }
}

impl Store for MemoryStore {
    type Session = MemorySession;

    fn snapshot(&self, statement_timeout: Duration) -> StoreFuture<'_, MemorySession> {
        Box::pin(async move {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable(
                    "no connection available".to_string(),
                ));
            }
            let tables = {
                let guard = self.tables.read().unwrap_or_else(|e| e.into_inner());
                Arc::clone(&*guard)
            };
            Ok(MemorySession {
                tables,
                now: self.now,
                latency: Duration::from_millis(self.latency_ms.load(Ordering::SeqCst)),
                statement_timeout,
                lease: SessionLease::acquire(&self.stats),
            })
        })
    }
}

/// A session pinned to one version of the tables
#[derive(Debug)]
pub struct MemorySession {
    tables: Arc<MemoryTables>,
    now: DateTime<Utc>,
    latency: Duration,
    statement_timeout: Duration,
    lease: SessionLease,
}

impl Session for MemorySession {
    fn read<'a>(&'a mut self, statement: &'a Statement) -> StoreFuture<'a, Vec<Row>> {
        Box::pin(async move {
            self.lease.0.reads.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                // statement_timeout is enforced on the store side too
                if self.latency > self.statement_timeout {
                    tokio::time::sleep(self.statement_timeout).await;
                    return Err(StoreError::Timeout(format!(
                        "canceling statement after {}ms",
                        self.statement_timeout.as_millis()
                    )));
                }
                tokio::time::sleep(self.latency).await;
            }
            evaluate(&self.tables, self.now, statement.logical())
        })
    }

    fn finish(self) -> StoreFuture<'static, ()> {
        Box::pin(async move {
            drop(self);
            Ok(())
        })
    }
}

fn evaluate(tables: &MemoryTables, now: DateTime<Utc>, read: &LogicalRead) -> StoreResult<Vec<Row>> {
    let rows = match read {
        LogicalRead::SearchCount(filter) => {
            let ids: BTreeSet<i64> = matching_rows(tables, now, filter)
                .iter()
                .map(|j| j.article.id)
                .collect();
            vec![count_row(ids.len())]
        }
        LogicalRead::SearchPage { filter, pagination } => page_rows(tables, now, filter, pagination),
        LogicalRead::Categories => tables
            .articles
            .values()
            .filter_map(|a| a.collection.as_deref())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|c| Row::new(vec![Value::from(c)]))
            .collect(),
        LogicalRead::AuthorRanks { category, limit } => author_rank_rows(tables, category, *limit),
        LogicalRead::Distribution { category } => {
            let mut buckets: Vec<&DistributionRecord> = tables
                .distribution
                .iter()
                .filter(|d| &d.category == category)
                .collect();
            buckets.sort_by_key(|d| d.bucket);
            buckets
                .into_iter()
                .map(|d| Row::new(vec![Value::Int(d.bucket), Value::Int(d.count)]))
                .collect()
        }
        LogicalRead::DistributionValue { key } => tables
            .distribution
            .iter()
            .filter(|d| &d.category == key)
            .map(|d| Row::new(vec![Value::Int(d.count)]))
            .collect(),
        LogicalRead::ArticleCount(which) => {
            let n = tables
                .articles
                .values()
                .filter(|a| match which {
                    ArticleCount::All => true,
                    ArticleCount::MissingAbstract => a.abstract_text.is_none(),
                    ArticleCount::MissingPosted => a.posted.is_none(),
                })
                .count();
            vec![count_row(n)]
        }
        LogicalRead::AuthorCount => vec![count_row(tables.authors.len())],
        LogicalRead::OutdatedByCollection { days } => {
            let cutoff = now - chrono::Duration::days(i64::from(*days));
            let mut counts: BTreeMap<Option<&str>, usize> = BTreeMap::new();
            for article in tables.articles.values() {
                if midnight(article.last_crawled) < cutoff {
                    *counts.entry(article.collection.as_deref()).or_default() += 1;
                }
            }
            // NULL collections sort last, as in SQL ascending order
            let (nulls, named): (Vec<_>, Vec<_>) = counts.into_iter().partition(|(c, _)| c.is_none());
            named
                .into_iter()
                .chain(nulls)
                .map(|(c, n)| Row::new(vec![Value::from(c), Value::Int(n as i64)]))
                .collect()
        }
    };
    Ok(rows)
}

fn count_row(n: usize) -> Row {
    Row::new(vec![Value::Int(n as i64)])
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// An article joined to one row of its ranking relation
struct Joined<'t> {
    article: &'t ArticleRecord,
    rank: i64,
    value: i64,
    source_date: Option<NaiveDate>,
}

fn joined_rows<'t>(tables: &'t MemoryTables, filter: &SearchFilter) -> Vec<Joined<'t>> {
    let relation = filter.source().relation;
    match relation {
        RankingRelation::CrossrefDaily => {
            let mut by_doi: BTreeMap<&str, &ArticleRecord> = BTreeMap::new();
            for article in tables.articles.values() {
                if let Some(doi) = article.doi.as_deref() {
                    by_doi.insert(doi, article);
                }
            }
            tables
                .mentions
                .iter()
                .filter_map(|m| {
                    by_doi.get(m.doi.as_str()).map(|&article| Joined {
                        article,
                        rank: 0,
                        value: m.count,
                        source_date: Some(m.source_date),
                    })
                })
                .collect()
        }
        _ => tables
            .ranks
            .get(&relation)
            .map(|ranks| {
                ranks
                    .iter()
                    .filter_map(|r| {
                        tables.articles.get(&r.article).map(|article| Joined {
                            article,
                            rank: r.rank,
                            value: r.downloads,
                            source_date: None,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default(),
    }
}

fn matching_rows<'t>(tables: &'t MemoryTables, now: DateTime<Utc>, filter: &SearchFilter) -> Vec<Joined<'t>> {
    joined_rows(tables, filter)
        .into_iter()
        .filter(|row| filter.fragments().iter().all(|f| fragment_matches(f, row, now)))
        .collect()
}

fn fragment_matches(fragment: &PredicateFragment, row: &Joined<'_>, now: DateTime<Utc>) -> bool {
    match fragment.kind() {
        PredicateKind::Text => fragment
            .query_text()
            .is_some_and(|q| text_matches(row.article, q)),
        PredicateKind::PositiveDownloads => row.value > 0,
        PredicateKind::Category => match (fragment.categories(), row.article.collection.as_ref()) {
            (Some(categories), Some(collection)) => categories.contains(collection),
            _ => false,
        },
        PredicateKind::TimeWindow => match (fragment.window_days(), row.source_date) {
            (Some(days), Some(date)) => midnight(date) > now - chrono::Duration::days(days),
            _ => false,
        },
    }
}

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn text_matches(article: &ArticleRecord, query: &str) -> bool {
    let wanted: BTreeSet<String> = terms(query).collect();
    // A query with no terms matches nothing, like an empty tsquery
    if wanted.is_empty() {
        return false;
    }
    let mut present: BTreeSet<String> = terms(&article.title).collect();
    if let Some(text) = &article.abstract_text {
        present.extend(terms(text));
    }
    for author in &article.authors {
        present.extend(terms(author));
    }
    wanted.is_subset(&present)
}

fn page_rows(
    tables: &MemoryTables,
    now: DateTime<Utc>,
    filter: &SearchFilter,
    pagination: &Pagination,
) -> Vec<Row> {
    let source = filter.source();
    let matched = matching_rows(tables, now, filter);

    // (order key, article, metric value)
    let mut ranked: Vec<(i64, &ArticleRecord, i64)> = if source.aggregate {
        let mut sums: BTreeMap<i64, (&ArticleRecord, i64)> = BTreeMap::new();
        for row in &matched {
            sums.entry(row.article.id).or_insert((row.article, 0)).1 += row.value;
        }
        sums.into_values().map(|(a, sum)| (sum, a, sum)).collect()
    } else {
        matched.iter().map(|j| (j.rank, j.article, j.value)).collect()
    };

    ranked.sort_by(|(ka, a, _), (kb, b, _)| {
        let primary = match source.direction {
            SortDirection::Asc => ka.cmp(kb),
            SortDirection::Desc => kb.cmp(ka),
        };
        primary.then(a.id.cmp(&b.id))
    });

    let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
    ranked
        .into_iter()
        .skip(offset)
        .take(pagination.page_size() as usize)
        .map(|(_, a, value)| {
            Row::new(vec![
                Value::Int(value),
                Value::Int(a.id),
                Value::from(a.url.clone()),
                Value::from(a.title.clone()),
                Value::from(a.abstract_text.clone()),
                Value::from(a.collection.clone()),
                Value::from(a.origin_month),
                Value::from(a.origin_year),
                Value::from(a.posted),
                Value::from(a.doi.clone()),
            ])
        })
        .collect()
}

fn author_rank_rows(tables: &MemoryTables, category: &Option<String>, limit: u32) -> Vec<Row> {
    let mut ranks: Vec<&AuthorRankRecord> = tables
        .author_ranks
        .iter()
        .filter(|r| &r.category == category)
        .collect();
    ranks.sort_by_key(|r| (r.rank, r.author));
    ranks
        .into_iter()
        .filter_map(|r| tables.authors.get(&r.author).map(|a| (a, r)))
        .take(limit as usize)
        .map(|(a, r)| {
            Row::new(vec![
                Value::Int(a.id),
                Value::from(a.name.clone()),
                Value::Int(r.rank),
                Value::Int(r.downloads),
                Value::Bool(r.tie),
            ])
        })
        .collect()
}
