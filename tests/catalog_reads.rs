//! Catalog Read Tests
//!
//! Categories, author rankings, download distribution and site statistics
//! over the in-memory store.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rxrank::catalog::{Catalog, CatalogOptions};
use rxrank::engine::SearchError;
use rxrank::store::{ArticleRecord, AuthorRankRecord, MemoryStore};

// =============================================================================
// Helper Functions
// =============================================================================

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn catalog() -> Catalog {
    Catalog::new(CatalogOptions {
        statement_timeout: Duration::from_secs(1),
        author_ranks_limit: 3,
        outdated_days: 7,
    })
}

fn author_rank(author: i64, category: Option<&str>, rank: i64, downloads: i64) -> AuthorRankRecord {
    AuthorRankRecord {
        author,
        category: category.map(str::to_string),
        rank,
        downloads,
        tie: false,
    }
}

fn store() -> MemoryStore {
    let store = MemoryStore::new(now());

    store.insert_article(
        ArticleRecord::new(1, "Fresh genomics paper")
            .with_collection("genomics")
            .with_abstract("Abstract text")
            .with_posted(day(2024, 6, 1))
            .with_last_crawled(day(2024, 6, 14)),
    );
    store.insert_article(
        ArticleRecord::new(2, "Stale genomics paper")
            .with_collection("genomics")
            .with_last_crawled(day(2024, 5, 1)),
    );
    store.insert_article(
        ArticleRecord::new(3, "Stale neuroscience paper")
            .with_collection("neuroscience")
            .with_abstract("Abstract text")
            .with_last_crawled(day(2024, 4, 1)),
    );
    store.insert_article(ArticleRecord::new(4, "Uncategorized").with_posted(day(2024, 6, 2)));

    for (id, name) in [(10, "Ada"), (11, "Grace"), (12, "Barbara"), (13, "Frances")] {
        store.insert_author(id, name);
    }
    store.insert_author_rank(author_rank(11, None, 1, 900));
    store.insert_author_rank(author_rank(10, None, 2, 800));
    store.insert_author_rank(author_rank(13, None, 3, 700));
    store.insert_author_rank(author_rank(12, None, 4, 600));
    store.insert_author_rank(author_rank(12, Some("genomics"), 1, 300));
    store.insert_author_rank(author_rank(10, Some("genomics"), 2, 200));

    store.insert_distribution("paper", 100, 7);
    store.insert_distribution("paper", 0, 12);
    store.insert_distribution("paper", 200, 3);
    store.insert_distribution("paper_mean", 0, 150);
    store.insert_distribution("paper_median", 0, 90);
    store.insert_distribution("author", 0, 4);

    store
}

// =============================================================================
// Categories
// =============================================================================

#[tokio::test]
async fn test_categories_distinct_sorted() {
    let store = store();
    let categories = catalog().categories(&store).await.unwrap();
    assert_eq!(categories, vec!["genomics", "neuroscience"]);
    assert_eq!(store.snapshots(), 1);
    assert_eq!(store.open_sessions(), 0);
}

// =============================================================================
// Author Rankings
// =============================================================================

#[tokio::test]
async fn test_overall_author_rankings_limited() {
    let authors = catalog().author_rankings(&store(), None).await.unwrap();
    let names: Vec<_> = authors.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Grace", "Ada", "Frances"]);
    assert_eq!(authors[0].rank, 1);
    assert_eq!(authors[0].downloads, 900);
}

#[tokio::test]
async fn test_category_author_rankings() {
    let store = store();
    let authors = catalog()
        .author_rankings(&store, Some("genomics"))
        .await
        .unwrap();
    let ids: Vec<_> = authors.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![12, 10]);

    // A blank category means overall
    let overall = catalog().author_rankings(&store, Some("  ")).await.unwrap();
    assert_eq!(overall[0].name, "Grace");
}

// =============================================================================
// Download Distribution
// =============================================================================

#[tokio::test]
async fn test_paper_distribution() {
    let store = store();
    let dist = catalog().download_distribution(&store, "paper").await.unwrap();
    let buckets: Vec<_> = dist.buckets.iter().map(|b| (b.bucket, b.count)).collect();
    assert_eq!(buckets, vec![(0, 12), (100, 7), (200, 3)]);
    assert_eq!(dist.mean, 150.0);
    assert_eq!(dist.median, 90.0);
    // Histogram, mean and median all come from one snapshot
    assert_eq!(store.snapshots(), 1);
    assert_eq!(store.reads(), 3);
}

#[tokio::test]
async fn test_missing_summary_values_are_zero() {
    let dist = catalog()
        .download_distribution(&store(), "author")
        .await
        .unwrap();
    assert_eq!(dist.buckets.len(), 1);
    assert_eq!(dist.mean, 0.0);
    assert_eq!(dist.median, 0.0);
}

#[tokio::test]
async fn test_unknown_distribution_kind_rejected() {
    let store = store();
    let err = catalog()
        .download_distribution(&store, "institution")
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Validation(_)));
    assert_eq!(store.snapshots(), 0);
}

// =============================================================================
// Site Statistics
// =============================================================================

#[tokio::test]
async fn test_site_stats() {
    let store = store();
    let stats = catalog().site_stats(&store).await.unwrap();
    assert_eq!(stats.papers_indexed, 4);
    assert_eq!(stats.authors_indexed, 4);
    assert_eq!(stats.missing_abstract, 2);
    assert_eq!(stats.missing_date, 2);

    // Article 4 was never crawled but has no collection
    assert_eq!(stats.outdated_count.len(), 2);
    assert_eq!(stats.outdated_count["genomics"], 1);
    assert_eq!(stats.outdated_count["neuroscience"], 1);

    assert_eq!(store.snapshots(), 1);
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn test_site_stats_store_unavailable() {
    let store = store();
    store.set_unavailable(true);
    let err = catalog().site_stats(&store).await.unwrap_err();
    assert!(err.is_retriable());
}
