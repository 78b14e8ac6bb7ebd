//! Search entry point

use std::time::Duration;

use tracing::{debug, info_span, warn, Instrument};

use crate::config::EngineConfig;
use crate::executor::{Deadline, ResultPage, SearchExecutor};
use crate::planner::{
    AssembledQuery, ExplainPlan, MetricSourceTable, PlannerResult, PredicateBuilder,
    QueryAssembler,
};
use crate::request::{PageLimits, SearchParams, SearchRequest, ValidationResult};
use crate::store::{Session, Store};

use super::errors::{SearchError, SearchResult};

/// Per-engine execution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Set on the store session for each statement, and the time budget
    /// for one whole search
    pub statement_timeout: Duration,
    pub page_limits: PageLimits,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            statement_timeout: Duration::from_secs(10),
            page_limits: PageLimits::default(),
        }
    }
}

/// Builds and runs ranked searches
#[derive(Debug, Clone)]
pub struct QueryEngine {
    sources: MetricSourceTable,
    options: SearchOptions,
}

impl QueryEngine {
    /// Engine over the standard ranking relations
    pub fn new(options: SearchOptions) -> PlannerResult<Self> {
        Ok(Self::with_sources(MetricSourceTable::standard()?, options))
    }

    /// Engine over an already validated source table
    pub fn with_sources(sources: MetricSourceTable, options: SearchOptions) -> Self {
        Self { sources, options }
    }

    pub fn from_config(config: &EngineConfig) -> PlannerResult<Self> {
        Self::new(SearchOptions {
            statement_timeout: config.statement_timeout(),
            page_limits: config.page_limits(),
        })
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn sources(&self) -> &MetricSourceTable {
        &self.sources
    }

    /// Parses and checks raw parameters against this engine's page limits
    pub fn validate(&self, params: &SearchParams) -> ValidationResult<SearchRequest> {
        params.validate(&self.options.page_limits)
    }

    /// Renders the count/page pair for a validated request
    pub fn plan(&self, request: &SearchRequest) -> ValidationResult<AssembledQuery> {
        let fragments = PredicateBuilder::build(request)?;
        let source = self.sources.resolve(request.metric(), request.timeframe())?;
        Ok(QueryAssembler::assemble(
            fragments,
            source,
            request.pagination(),
        ))
    }

    /// Describes what `search` would run, without touching a store
    pub fn explain(&self, params: &SearchParams) -> ExplainPlan {
        match self.validate(params).and_then(|request| self.plan(&request)) {
            Ok(query) => ExplainPlan::from_query(&query),
            Err(e) => ExplainPlan::from_error(&e),
        }
    }

    /// Validates `params` and runs the search. Invalid requests fail before
    /// any store call.
    pub async fn search<S: Store>(
        &self,
        store: &S,
        params: &SearchParams,
    ) -> SearchResult<ResultPage> {
        let request = self.validate(params).map_err(|e| {
            let err = SearchError::from(e);
            err.log();
            err
        })?;
        self.search_request(store, &request).await
    }

    /// Runs a validated request on one snapshot session
    pub async fn search_request<S: Store>(
        &self,
        store: &S,
        request: &SearchRequest,
    ) -> SearchResult<ResultPage> {
        let span = info_span!(
            "search",
            metric = request.metric().as_str(),
            timeframe = request.timeframe().as_str(),
            page = request.pagination().page(),
            page_size = request.pagination().page_size(),
        );

        async move {
            let outcome = self.run(store, request).await;
            if let Err(e) = &outcome {
                e.log();
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run<S: Store>(&self, store: &S, request: &SearchRequest) -> SearchResult<ResultPage> {
        let query = self.plan(request)?;
        let timeout = self.options.statement_timeout;
        let deadline = Deadline::after(timeout);

        let mut session = deadline.run("snapshot", store.snapshot(timeout)).await?;
        // On error the session is dropped here, which ends the snapshot
        let page = SearchExecutor::new(deadline)
            .execute(&mut session, &query)
            .await?;

        if let Err(e) = session.finish().await {
            // The page was fully read; a failed rollback only affects the connection
            warn!(error = %e, "failed to end snapshot");
        }
        debug!(total = page.total, returned = page.len(), "search complete");
        Ok(page)
    }
}
