//! Search Property Tests
//!
//! End-to-end properties of `QueryEngine::search` over the in-memory store:
//! - Count/page consistency
//! - Filter commutativity and canonical clause order
//! - Pagination
//! - Metric-specific filtering (zero downloads, time windows)
//! - Validation before any store call

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rxrank::engine::{QueryEngine, SearchError, SearchOptions};
use rxrank::planner::RankingRelation;
use rxrank::request::{Metric, SearchParams, SearchRequest, Timeframe, ValidationErrorCode};
use rxrank::store::{ArticleRecord, MemoryStore, RankRecord};

// =============================================================================
// Helper Functions
// =============================================================================

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine() -> QueryEngine {
    QueryEngine::new(SearchOptions::default()).unwrap()
}

fn params(metric: &str, timeframe: &str) -> SearchParams {
    SearchParams {
        metric: metric.to_string(),
        timeframe: timeframe.to_string(),
        ..Default::default()
    }
}

fn article(id: i64, title: &str, collection: &str) -> ArticleRecord {
    ArticleRecord::new(id, title)
        .with_collection(collection)
        .with_doi(format!("10.1101/{}", id))
        .with_url(format!("https://www.biorxiv.org/content/10.1101/{}", id))
        .with_posted(day(2024, 1, 10))
}

fn rank(store: &MemoryStore, relation: RankingRelation, id: i64, rank: i64, downloads: i64) {
    store.insert_rank(
        relation,
        RankRecord {
            article: id,
            rank,
            downloads,
        },
    );
}

/// Ten articles across three collections, ranked all-time by id
fn mixed_store() -> MemoryStore {
    let store = MemoryStore::new(now());
    let collections = ["bioinformatics", "genomics", "neuroscience"];
    for id in 1..=10 {
        let title = if id % 2 == 0 {
            format!("Kinase pathway study {}", id)
        } else {
            format!("Membrane transport study {}", id)
        };
        store.insert_article(article(id, &title, collections[(id % 3) as usize]));
        rank(&store, RankingRelation::AlltimeRanks, id, id, 1000 - id);
    }
    store
}

/// `n` matching articles, all ranked all-time
fn uniform_store(n: i64) -> MemoryStore {
    let store = MemoryStore::new(now());
    for id in 1..=n {
        store.insert_article(article(id, "Kinase study", "genomics"));
        rank(&store, RankingRelation::AlltimeRanks, id, id, 10_000 - id);
    }
    store
}

fn ids(page: &rxrank::executor::ResultPage) -> Vec<i64> {
    page.results.iter().map(|r| r.id).collect()
}

// =============================================================================
// Count/Page Consistency
// =============================================================================

#[tokio::test]
async fn test_total_zero_iff_first_page_empty() {
    let store = mixed_store();
    let engine = engine();

    let cases = [
        ("", vec![]),
        ("kinase", vec![]),
        ("kinase", vec!["genomics".to_string()]),
        ("nonexistent", vec![]),
        ("", vec!["zoology".to_string()]),
    ];
    for (q, categories) in cases {
        let p = SearchParams {
            q: q.to_string(),
            categories,
            ..Default::default()
        };
        let page = engine.search(&store, &p).await.unwrap();
        assert_eq!(page.total == 0, page.results.is_empty(), "query {:?}", q);
    }
}

#[tokio::test]
async fn test_total_counts_all_matches_not_page() {
    let store = mixed_store();
    let p = SearchParams {
        q: "kinase".to_string(),
        page_size: Some(2),
        ..Default::default()
    };
    let page = engine().search(&store, &p).await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(ids(&page), vec![2, 4]);
}

#[tokio::test]
async fn test_empty_ranking_table_is_empty_page() {
    let store = MemoryStore::new(now());
    store.insert_article(article(1, "Kinase study", "genomics"));
    let page = engine()
        .search(&store, &params("downloads", "ytd"))
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(page.results.is_empty());
}

// =============================================================================
// Filter Commutativity
// =============================================================================

#[tokio::test]
async fn test_category_order_does_not_matter() {
    let store = mixed_store();
    let engine = engine();

    let a = SearchParams {
        categories: vec!["bioinformatics".into(), "genomics".into()],
        ..Default::default()
    };
    let b = SearchParams {
        categories: vec!["genomics".into(), "bioinformatics".into()],
        ..Default::default()
    };
    let page_a = engine.search(&store, &a).await.unwrap();
    let page_b = engine.search(&store, &b).await.unwrap();
    assert_eq!(page_a, page_b);
    assert!(page_a.total > 0);

    let collections: BTreeSet<_> = page_a
        .results
        .iter()
        .filter_map(|r| r.collection.clone())
        .collect();
    assert!(!collections.contains("neuroscience"));
}

#[test]
fn test_clause_shape_independent_of_field_order() {
    let engine = engine();
    let forward = SearchRequest::new(Metric::Downloads, Timeframe::Alltime)
        .unwrap()
        .with_query("kinase")
        .with_categories(["genomics"]);
    let backward = SearchRequest::new(Metric::Downloads, Timeframe::Alltime)
        .unwrap()
        .with_categories(["genomics"])
        .with_query("kinase");

    let a = engine.plan(&forward).unwrap();
    let b = engine.plan(&backward).unwrap();
    assert_eq!(a.filter_clause(), b.filter_clause());
    assert_eq!(a.params(), b.params());

    let clause = a.filter_clause();
    let text = clause.find("plainto_tsquery").unwrap();
    let downloads = clause.find("r.downloads > 0").unwrap();
    let category = clause.find("a.collection = ANY").unwrap();
    assert!(text < downloads && downloads < category);
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn test_pages_split_without_overlap() {
    let store = uniform_store(35);
    let engine = engine();

    let mut p = SearchParams {
        q: "kinase".into(),
        page_size: Some(20),
        ..Default::default()
    };
    let first = engine.search(&store, &p).await.unwrap();
    p.page = 1;
    let second = engine.search(&store, &p).await.unwrap();

    assert_eq!(first.total, 35);
    assert_eq!(second.total, 35);
    assert_eq!(first.results.len(), 20);
    assert_eq!(second.results.len(), 15);

    let a: BTreeSet<_> = ids(&first).into_iter().collect();
    let b: BTreeSet<_> = ids(&second).into_iter().collect();
    assert!(a.is_disjoint(&b));
    assert_eq!(a.len() + b.len(), 35);
}

#[tokio::test]
async fn test_page_past_end_keeps_total() {
    let store = uniform_store(5);
    let p = SearchParams {
        page: 3,
        page_size: Some(20),
        ..Default::default()
    };
    let page = engine().search(&store, &p).await.unwrap();
    assert!(page.results.is_empty());
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn test_downloads_ordered_by_rank() {
    let store = MemoryStore::new(now());
    for (id, r) in [(1, 3), (2, 1), (3, 2)] {
        store.insert_article(article(id, "Paper", "genomics"));
        rank(&store, RankingRelation::MonthRanks, id, r, 100 * (4 - r));
    }
    let page = engine()
        .search(&store, &params("downloads", "lastmonth"))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![2, 3, 1]);
    assert_eq!(page.results[0].metric_value, 300);
}

// =============================================================================
// Metric-Specific Filtering
// =============================================================================

#[tokio::test]
async fn test_zero_downloads_excluded_from_downloads_only() {
    let store = MemoryStore::new(now());
    store.insert_article(article(1, "Popular", "genomics"));
    store.insert_article(article(2, "Ignored", "genomics"));
    rank(&store, RankingRelation::AlltimeRanks, 1, 1, 50);
    rank(&store, RankingRelation::AlltimeRanks, 2, 2, 0);
    store.insert_mention("10.1101/2", 4, day(2024, 6, 1));

    let engine = engine();
    let downloads = engine
        .search(&store, &params("downloads", "alltime"))
        .await
        .unwrap();
    assert_eq!(ids(&downloads), vec![1]);
    assert_eq!(downloads.total, 1);

    let social = engine
        .search(&store, &params("social", "alltime"))
        .await
        .unwrap();
    assert_eq!(ids(&social), vec![2]);
    assert_eq!(social.results[0].metric_value, 4);
}

#[tokio::test]
async fn test_week_window_excludes_eight_day_old_mentions() {
    let store = MemoryStore::new(now());
    store.insert_article(article(1, "Recent", "genomics"));
    store.insert_article(article(2, "Stale", "genomics"));
    store.insert_mention("10.1101/1", 3, day(2024, 6, 13));
    store.insert_mention("10.1101/1", 2, day(2024, 6, 14));
    // 8 days before now
    store.insert_mention("10.1101/1", 100, day(2024, 6, 7));
    store.insert_mention("10.1101/2", 50, day(2024, 6, 7));

    let page = engine()
        .search(&store, &params("social", "week"))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(ids(&page), vec![1]);
    assert_eq!(page.results[0].metric_value, 5);
}

#[tokio::test]
async fn test_social_sums_and_orders_descending() {
    let store = MemoryStore::new(now());
    for id in 1..=3 {
        store.insert_article(article(id, "Paper", "genomics"));
    }
    store.insert_mention("10.1101/1", 2, day(2024, 5, 1));
    store.insert_mention("10.1101/2", 5, day(2024, 5, 1));
    store.insert_mention("10.1101/2", 5, day(2024, 5, 2));
    store.insert_mention("10.1101/3", 7, day(2024, 5, 3));

    let page = engine()
        .search(&store, &params("social", "year"))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![2, 3, 1]);
    assert_eq!(page.results[0].metric_value, 10);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn test_twitter_alias_matches_social() {
    let store = MemoryStore::new(now());
    store.insert_article(article(1, "Paper", "genomics"));
    store.insert_mention("10.1101/1", 1, day(2024, 6, 15));

    let engine = engine();
    let social = engine.search(&store, &params("social", "day")).await.unwrap();
    let twitter = engine.search(&store, &params("twitter", "day")).await.unwrap();
    assert_eq!(social, twitter);
    assert_eq!(social.total, 1);
}

// =============================================================================
// Validation Before Store Access
// =============================================================================

#[tokio::test]
async fn test_unknown_metric_issues_no_store_calls() {
    let store = mixed_store();
    let err = engine()
        .search(&store, &params("citations", "alltime"))
        .await
        .unwrap_err();

    match err {
        SearchError::Validation(e) => assert_eq!(e.code(), ValidationErrorCode::InvalidMetric),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.snapshots(), 0);
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn test_mismatched_timeframe_issues_no_store_calls() {
    let store = mixed_store();
    let err = engine()
        .search(&store, &params("downloads", "week"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(!err.is_retriable());
    assert_eq!(store.snapshots(), 0);
}

#[tokio::test]
async fn test_oversized_page_rejected() {
    let store = mixed_store();
    let p = SearchParams {
        page_size: Some(10_000),
        ..Default::default()
    };
    let err = engine().search(&store, &p).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert_eq!(store.reads(), 0);
}

// =============================================================================
// Empty Query Text
// =============================================================================

#[tokio::test]
async fn test_empty_query_matches_everything_else_allows() {
    let store = mixed_store();
    let engine = engine();

    let all = engine.search(&store, &SearchParams::default()).await.unwrap();
    assert_eq!(all.total, 10);

    let blank = SearchParams {
        q: "   ".into(),
        ..Default::default()
    };
    assert_eq!(engine.search(&store, &blank).await.unwrap(), all);

    let genomics = SearchParams {
        categories: vec!["genomics".into()],
        ..Default::default()
    };
    let page = engine.search(&store, &genomics).await.unwrap();
    assert!(page
        .results
        .iter()
        .all(|r| r.collection.as_deref() == Some("genomics")));

    let plan = engine.explain(&SearchParams::default());
    assert!(!plan.predicates.iter().any(|p| p == "text"));
}

#[tokio::test]
async fn test_blank_category_narrows_to_nothing() {
    let store = mixed_store();
    let engine = engine();
    let params = SearchParams {
        categories: vec!["".into()],
        ..Default::default()
    };

    let page = engine.search(&store, &params).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(page.results.is_empty());

    let plan = engine.explain(&params);
    assert!(plan.predicates.iter().any(|p| p == "category"));
}
