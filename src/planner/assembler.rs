//! Query assembler
//!
//! The single point where fragments become SQL text. Both statements share
//! one rendered FROM/JOIN/WHERE clause and one parameter list; they differ
//! only in projection and in what follows the filter.

use std::sync::Arc;

use crate::request::Pagination;
use crate::store::{LogicalRead, SqlParam, Statement};

use super::predicate::{PredicateFragment, PredicateKind, TEXT_VECTORS};
use super::source::MetricSource;

/// Display columns projected after the metric value on the page statement
pub const PAGE_COLUMNS: [&str; 9] = [
    "a.id",
    "a.url",
    "a.title",
    "a.abstract",
    "a.collection",
    "a.origin_month",
    "a.origin_year",
    "a.posted",
    "a.doi",
];

/// Fragments in canonical order plus the source they filter
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    fragments: Vec<PredicateFragment>,
    source: MetricSource,
}

impl SearchFilter {
    pub fn new(mut fragments: Vec<PredicateFragment>, source: MetricSource) -> Self {
        fragments.sort_by_key(PredicateFragment::kind);
        Self { fragments, source }
    }

    pub fn fragments(&self) -> &[PredicateFragment] {
        &self.fragments
    }

    pub fn source(&self) -> &MetricSource {
        &self.source
    }
}

/// Count and page statements over one shared filter
#[derive(Debug, Clone)]
pub struct AssembledQuery {
    filter: Arc<SearchFilter>,
    filter_clause: String,
    params: Vec<SqlParam>,
    pagination: Pagination,
    count: Statement,
    page: Statement,
}

impl AssembledQuery {
    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    /// Rendered ` FROM ... [WHERE ...]` shared by both statements
    pub fn filter_clause(&self) -> &str {
        &self.filter_clause
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn count(&self) -> &Statement {
        &self.count
    }

    pub fn page(&self) -> &Statement {
        &self.page
    }

    /// Number of columns each page row carries
    pub fn page_arity(&self) -> usize {
        PAGE_COLUMNS.len() + 1
    }
}

/// Builds count/page statement pairs
pub struct QueryAssembler;

impl QueryAssembler {
    pub fn assemble(
        fragments: Vec<PredicateFragment>,
        source: &MetricSource,
        pagination: Pagination,
    ) -> AssembledQuery {
        let filter = Arc::new(SearchFilter::new(fragments, source.clone()));
        let (filter_clause, params) = Self::render_filter(&filter);

        let count_text = format!("SELECT COUNT(DISTINCT a.id){}", filter_clause);

        let mut page_text = format!(
            "SELECT {}, {}{}",
            source.value_expr,
            PAGE_COLUMNS.join(", "),
            filter_clause
        );
        if source.aggregate {
            page_text.push_str(" GROUP BY a.id");
        }
        page_text.push_str(" ORDER BY ");
        page_text.push_str(&source.ordering());
        page_text.push_str(&format!(" LIMIT {}", pagination.page_size()));
        // Page 0 gets no OFFSET at all
        if pagination.page() > 0 {
            page_text.push_str(&format!(" OFFSET {}", pagination.offset()));
        }

        let count = Statement::new(
            count_text,
            params.clone(),
            LogicalRead::SearchCount(Arc::clone(&filter)),
        );
        let page = Statement::new(
            page_text,
            params.clone(),
            LogicalRead::SearchPage {
                filter: Arc::clone(&filter),
                pagination,
            },
        );

        AssembledQuery {
            filter,
            filter_clause,
            params,
            pagination,
            count,
            page,
        }
    }

    fn render_filter(filter: &SearchFilter) -> (String, Vec<SqlParam>) {
        let source = filter.source();
        let mut clause = format!(
            " FROM articles AS a INNER JOIN {} AS r ON {}",
            source.relation.table_name(),
            source.join.on_clause()
        );

        let mut params = Vec::new();
        let mut conjuncts = Vec::new();
        for fragment in filter.fragments() {
            conjuncts.push(Self::render_fragment(fragment, params.len() + 1));
            params.extend(fragment.params().iter().cloned());
        }

        if !conjuncts.is_empty() {
            clause.push_str(" WHERE ");
            clause.push_str(&conjuncts.join(" AND "));
        }
        (clause, params)
    }

    /// `first` is the placeholder number of the fragment's first parameter.
    fn render_fragment(fragment: &PredicateFragment, first: usize) -> String {
        match fragment.kind() {
            PredicateKind::Text => {
                format!("plainto_tsquery(${}) @@ ({})", first, weighted_text_vector())
            }
            PredicateKind::PositiveDownloads => "r.downloads > 0".to_string(),
            PredicateKind::Category => format!("a.collection = ANY(${})", first),
            PredicateKind::TimeWindow => {
                format!("r.source_date > now() - make_interval(days => ${}::int)", first)
            }
        }
    }
}

fn weighted_text_vector() -> String {
    TEXT_VECTORS
        .iter()
        .map(|(column, weight)| {
            format!("setweight(coalesce({}, ''::tsvector), '{}')", column, weight)
        })
        .collect::<Vec<_>>()
        .join(" || ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{MetricSourceTable, PredicateBuilder};
    use crate::request::{Metric, SearchRequest, Timeframe};

    fn assemble(request: &SearchRequest) -> AssembledQuery {
        let table = MetricSourceTable::standard().unwrap();
        let fragments = PredicateBuilder::build(request).unwrap();
        let source = table
            .resolve(request.metric(), request.timeframe())
            .unwrap();
        QueryAssembler::assemble(fragments, source, request.pagination())
    }

    #[test]
    fn test_downloads_statements() {
        let req = SearchRequest::new(Metric::Downloads, Timeframe::Alltime)
            .unwrap()
            .with_query("kinase")
            .with_categories(["genomics"]);
        let q = assemble(&req);

        assert_eq!(
            q.count().text(),
            "SELECT COUNT(DISTINCT a.id) FROM articles AS a INNER JOIN alltime_ranks AS r \
             ON r.article = a.id WHERE plainto_tsquery($1) @@ (setweight(coalesce(a.title_vector, \
             ''::tsvector), 'A') || setweight(coalesce(a.abstract_vector, ''::tsvector), 'C') || \
             setweight(coalesce(a.author_vector, ''::tsvector), 'D')) AND r.downloads > 0 AND \
             a.collection = ANY($2)"
        );
        assert!(q.page().text().starts_with("SELECT r.downloads, a.id, a.url, a.title"));
        assert!(q.page().text().ends_with(" ORDER BY r.rank ASC LIMIT 20"));
        assert!(!q.page().text().contains("GROUP BY"));
        assert_eq!(
            q.params(),
            &[
                SqlParam::Text("kinase".into()),
                SqlParam::TextArray(vec!["genomics".into()])
            ]
        );
    }

    #[test]
    fn test_count_and_page_share_filter() {
        let req = SearchRequest::new(Metric::Social, Timeframe::Week)
            .unwrap()
            .with_query("kinase")
            .with_categories(["genomics", "bioinformatics"])
            .with_pagination(Pagination::new(2, 10).unwrap());
        let q = assemble(&req);

        let clause = q.filter_clause();
        assert!(q.count().text().ends_with(clause));
        let page = q.page().text();
        let tail = &page[page.find(clause).unwrap() + clause.len()..];
        assert_eq!(tail, " GROUP BY a.id ORDER BY SUM(r.count) DESC LIMIT 10 OFFSET 20");
        assert_eq!(q.count().params(), q.page().params());
        assert_eq!(q.params().len(), 3);
    }

    #[test]
    fn test_every_fragment_is_anded() {
        let req = SearchRequest::new(Metric::Social, Timeframe::Week)
            .unwrap()
            .with_query("kinase")
            .with_categories(["genomics"]);
        let q = assemble(&req);

        let clause = q.filter_clause();
        let where_part = &clause[clause.find(" WHERE ").unwrap() + 7..];
        assert!(!where_part.contains(" OR "));
        assert_eq!(where_part.split(" AND ").count(), 3);
        assert!(where_part.ends_with("r.source_date > now() - make_interval(days => $3::int)"));
    }

    #[test]
    fn test_no_offset_on_first_page() {
        let req = SearchRequest::new(Metric::Downloads, Timeframe::Ytd)
            .unwrap()
            .with_pagination(Pagination::new(0, 5).unwrap());
        let q = assemble(&req);
        assert!(!q.page().text().contains("OFFSET"));
        assert!(q.page().text().contains("ytd_ranks"));
    }

    #[test]
    fn test_social_alltime_has_no_where() {
        let req = SearchRequest::new(Metric::Social, Timeframe::Alltime).unwrap();
        let q = assemble(&req);
        assert!(!q.count().text().contains("WHERE"));
        assert!(q.params().is_empty());
        assert!(q.page().text().starts_with("SELECT SUM(r.count)::bigint, a.id"));
    }

    #[test]
    fn test_time_window_is_bound_not_inlined() {
        let req = SearchRequest::new(Metric::Social, Timeframe::Day).unwrap();
        let q = assemble(&req);
        assert!(q
            .count()
            .text()
            .ends_with("WHERE r.source_date > now() - make_interval(days => $1::int)"));
        assert_eq!(q.params(), &[SqlParam::Int(2)]);
    }

    #[test]
    fn test_user_text_never_reaches_sql() {
        let hostile = "x'); DROP TABLE articles; --";
        let req = SearchRequest::new(Metric::Downloads, Timeframe::Alltime)
            .unwrap()
            .with_query(hostile)
            .with_categories([hostile]);
        let q = assemble(&req);
        assert!(!q.count().text().contains("DROP"));
        assert!(!q.page().text().contains("DROP"));
        assert_eq!(q.params()[0], SqlParam::Text(hostile.into()));
    }

    #[test]
    fn test_fragment_order_does_not_change_clause() {
        let source = MetricSourceTable::standard()
            .unwrap()
            .resolve(Metric::Downloads, Timeframe::Alltime)
            .unwrap()
            .clone();
        let cats = vec!["genomics".to_string()];
        let forward = vec![
            PredicateFragment::text("kinase"),
            PredicateFragment::positive_downloads(),
            PredicateFragment::category(&cats),
        ];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();
        let pagination = Pagination::first(20).unwrap();

        let a = QueryAssembler::assemble(forward, &source, pagination);
        let b = QueryAssembler::assemble(reversed, &source, pagination);
        assert_eq!(a.filter_clause(), b.filter_clause());
        assert_eq!(a.params(), b.params());
    }

    #[test]
    fn test_logical_reads_share_one_filter() {
        let req = SearchRequest::new(Metric::Downloads, Timeframe::LastMonth).unwrap();
        let q = assemble(&req);
        match (q.count().logical(), q.page().logical()) {
            (LogicalRead::SearchCount(a), LogicalRead::SearchPage { filter: b, .. }) => {
                assert!(Arc::ptr_eq(a, b));
            }
            other => panic!("unexpected logical reads: {:?}", other),
        }
    }
}
