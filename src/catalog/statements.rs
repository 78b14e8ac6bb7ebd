//! Statement builders for catalog reads

use crate::store::{ArticleCount, LogicalRead, SqlParam, Statement};

/// Entity kinds with a stored download distribution
pub const DISTRIBUTION_KINDS: [&str; 2] = ["paper", "author"];

pub fn categories() -> Statement {
    Statement::new(
        "SELECT DISTINCT collection FROM articles \
         WHERE collection IS NOT NULL AND collection <> '' ORDER BY collection",
        Vec::new(),
        LogicalRead::Categories,
    )
}

/// Overall ranks without a category, per-category ranks with one
pub fn author_ranks(category: Option<&str>, limit: u32) -> Statement {
    let (table, filter, params) = match category {
        Some(c) => (
            "detailed_author_ranks_category",
            " WHERE r.category = $1",
            vec![SqlParam::Text(c.to_string())],
        ),
        None => ("detailed_author_ranks", "", Vec::new()),
    };
    Statement::new(
        format!(
            "SELECT a.id, a.name, r.rank, r.downloads, r.tie FROM detailed_authors AS a \
             INNER JOIN {} AS r ON a.id = r.author{} ORDER BY r.rank LIMIT {}",
            table, filter, limit
        ),
        params,
        LogicalRead::AuthorRanks {
            category: category.map(str::to_string),
            limit,
        },
    )
}

pub fn distribution(kind: &str) -> Statement {
    Statement::new(
        "SELECT bucket, count FROM download_distribution WHERE category = $1 ORDER BY bucket",
        vec![SqlParam::Text(kind.to_string())],
        LogicalRead::Distribution {
            category: kind.to_string(),
        },
    )
}

/// A summary row such as `paper_mean`
pub fn distribution_value(key: &str) -> Statement {
    Statement::new(
        "SELECT count::float8 FROM download_distribution WHERE category = $1",
        vec![SqlParam::Text(key.to_string())],
        LogicalRead::DistributionValue {
            key: key.to_string(),
        },
    )
}

pub(crate) fn article_count(which: ArticleCount) -> Statement {
    let text = match which {
        ArticleCount::All => "SELECT COUNT(id) FROM articles",
        ArticleCount::MissingAbstract => "SELECT COUNT(id) FROM articles WHERE abstract IS NULL",
        ArticleCount::MissingPosted => "SELECT COUNT(id) FROM articles WHERE posted IS NULL",
    };
    Statement::new(text, Vec::new(), LogicalRead::ArticleCount(which))
}

pub(crate) fn author_count() -> Statement {
    Statement::new(
        "SELECT COUNT(id) FROM detailed_authors",
        Vec::new(),
        LogicalRead::AuthorCount,
    )
}

pub(crate) fn outdated_by_collection(days: u32) -> Statement {
    Statement::new(
        "SELECT collection, COUNT(id) FROM articles \
         WHERE last_crawled < now() - make_interval(days => $1::int) \
         GROUP BY collection ORDER BY collection",
        vec![SqlParam::Int(i64::from(days))],
        LogicalRead::OutdatedByCollection { days },
    )
}
