//! Raw search parameters and the validated request built from them

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::errors::{ValidationError, ValidationResult};
use super::types::{Metric, Timeframe};

/// Page size bounds applied while validating raw parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Used when the caller does not ask for a page size
    pub default_page_size: u32,
    /// Largest page size a caller may ask for
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 250,
        }
    }
}

/// Zero-based page index plus page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    /// Creates pagination, rejecting a zero page size or an offset that
    /// does not fit a signed 64-bit integer.
    pub fn new(page: u32, page_size: u32) -> ValidationResult<Self> {
        if page_size == 0 {
            return Err(ValidationError::invalid_pagination(
                "page_size must be a positive integer",
            ));
        }
        let offset = u64::from(page) * u64::from(page_size);
        if offset > i64::MAX as u64 {
            return Err(ValidationError::invalid_pagination("page offset overflows"));
        }
        Ok(Self { page, page_size })
    }

    pub fn first(page_size: u32) -> ValidationResult<Self> {
        Self::new(0, page_size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }
}

/// Search parameters as received from the endpoint layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free-text query, possibly empty
    #[serde(default)]
    pub q: String,
    /// Categories (bioRxiv collections) to restrict to
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: Option<u32>,
}

fn default_metric() -> String {
    Metric::Downloads.as_str().to_string()
}

fn default_timeframe() -> String {
    Timeframe::Alltime.as_str().to_string()
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            q: String::new(),
            categories: Vec::new(),
            metric: default_metric(),
            timeframe: default_timeframe(),
            page: 0,
            page_size: None,
        }
    }
}

impl SearchParams {
    /// Validates metric, timeframe and pagination and builds the request.
    pub fn validate(&self, limits: &PageLimits) -> ValidationResult<SearchRequest> {
        let metric: Metric = self.metric.parse()?;
        let timeframe: Timeframe = self.timeframe.parse()?;

        let page_size = self.page_size.unwrap_or(limits.default_page_size);
        if page_size > limits.max_page_size {
            return Err(ValidationError::invalid_pagination(format!(
                "page_size {} exceeds maximum {}",
                page_size, limits.max_page_size
            )));
        }
        let pagination = Pagination::new(self.page, page_size)?;

        Ok(SearchRequest::new(metric, timeframe)?
            .with_query(&self.q)
            .with_categories(self.categories.iter().cloned())
            .with_pagination(pagination))
    }
}

/// A validated, immutable search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    query: String,
    categories: Vec<String>,
    metric: Metric,
    timeframe: Timeframe,
    pagination: Pagination,
}

impl SearchRequest {
    /// Creates a request for the first page of 20 rows with no text or
    /// category filter. Fails if the timeframe is not offered for the metric.
    pub fn new(metric: Metric, timeframe: Timeframe) -> ValidationResult<Self> {
        if !metric.supports(timeframe) {
            return Err(ValidationError::metric_timeframe_mismatch(
                metric.as_str(),
                timeframe.as_str(),
            ));
        }
        Ok(Self {
            query: String::new(),
            categories: Vec::new(),
            metric,
            timeframe,
            pagination: Pagination {
                page: 0,
                page_size: PageLimits::default().default_page_size,
            },
        })
    }

    /// Sets the free-text query. Surrounding whitespace is dropped, so a
    /// blank query behaves like no query.
    pub fn with_query(mut self, query: impl AsRef<str>) -> Self {
        self.query = query.as_ref().trim().to_string();
        self
    }

    /// Sets the category filter. Stored sorted and de-duplicated, so the
    /// order the caller listed them in never reaches the statement. Entries
    /// are kept verbatim: a blank name still narrows, and matches no
    /// collection.
    pub fn with_categories<I, C>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let set: BTreeSet<String> = categories.into_iter().map(Into::into).collect();
        self.categories = set.into_iter().collect();
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }
}
