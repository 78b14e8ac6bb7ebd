//! CLI command implementations
//!
//! Each command returns its JSON payload; `run` writes it. Commands that
//! read data are generic over the store so they run against any backend.

use std::path::Path;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::catalog::{Catalog, CatalogOptions};
use crate::config::EngineConfig;
use crate::engine::QueryEngine;
use crate::observability::init_logging;
use crate::request::SearchParams;
use crate::store::{PgStore, Store};

use super::args::{Cli, Command, SearchArgs};
use super::errors::CliResult;
use super::io::{read_request, write_error, write_response};

/// Parses arguments, sets up logging, runs the command and writes the
/// response. Failures are also written to stdout as an error object.
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.no_color) {
        eprintln!("logging disabled: {}", e);
    }

    let outcome = match load_config(cli.config.as_deref()) {
        Ok(config) => run_command(&config, cli.command).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::from_env()?,
    };
    debug!(
        statement_timeout_ms = config.statement_timeout_ms,
        max_connections = config.max_connections,
        "configuration loaded"
    );
    Ok(config)
}

/// Runs one command; only commands that read data connect to the database
pub async fn run_command(config: &EngineConfig, cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Explain(args) => explain(config, &search_params(&args)?),
        Command::Search(args) => {
            let params = search_params(&args)?;
            search(&connect(config).await?, config, &params).await
        }
        Command::Categories => categories(&connect(config).await?, config).await,
        Command::Authors { category } => {
            authors(&connect(config).await?, config, category.as_deref()).await
        }
        Command::Distribution { kind } => {
            distribution(&connect(config).await?, config, &kind).await
        }
        Command::Stats => stats(&connect(config).await?, config).await,
    }
}

fn search_params(args: &SearchArgs) -> CliResult<SearchParams> {
    if args.stdin {
        read_request()
    } else {
        Ok(args.to_params())
    }
}

async fn connect(config: &EngineConfig) -> CliResult<PgStore> {
    let store = PgStore::connect(
        &config.database_url,
        config.max_connections,
        config.acquire_timeout(),
    )
    .await
    .map_err(|e| {
        warn!(error = %e, "could not connect to database");
        e
    })?;
    Ok(store)
}

/// One page of ranked results with the total match count
pub async fn search<S: Store>(
    store: &S,
    config: &EngineConfig,
    params: &SearchParams,
) -> CliResult<Value> {
    let engine = QueryEngine::from_config(config)?;
    let page = engine.search(store, params).await?;
    Ok(serde_json::to_value(page)?)
}

/// Needs no database
pub fn explain(config: &EngineConfig, params: &SearchParams) -> CliResult<Value> {
    let engine = QueryEngine::from_config(config)?;
    let plan = engine.explain(params);
    debug!(plan = %plan, "explain");
    Ok(serde_json::to_value(plan)?)
}

pub async fn categories<S: Store>(store: &S, config: &EngineConfig) -> CliResult<Value> {
    let catalog = Catalog::new(CatalogOptions::from_config(config));
    Ok(json!({ "categories": catalog.categories(store).await? }))
}

pub async fn authors<S: Store>(
    store: &S,
    config: &EngineConfig,
    category: Option<&str>,
) -> CliResult<Value> {
    let catalog = Catalog::new(CatalogOptions::from_config(config));
    let results = catalog.author_rankings(store, category).await?;
    Ok(json!({ "category": category, "results": results }))
}

pub async fn distribution<S: Store>(
    store: &S,
    config: &EngineConfig,
    kind: &str,
) -> CliResult<Value> {
    let catalog = Catalog::new(CatalogOptions::from_config(config));
    Ok(serde_json::to_value(
        catalog.download_distribution(store, kind).await?,
    )?)
}

pub async fn stats<S: Store>(store: &S, config: &EngineConfig) -> CliResult<Value> {
    let catalog = Catalog::new(CatalogOptions::from_config(config));
    Ok(serde_json::to_value(catalog.site_stats(store).await?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliErrorCode;
    use crate::planner::RankingRelation;
    use crate::store::{ArticleRecord, MemoryStore, RankRecord};
    use chrono::{TimeZone, Utc};

    fn store() -> MemoryStore {
        let store = MemoryStore::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        store.insert_article(ArticleRecord::new(1, "Kinase signalling").with_collection("genomics"));
        store.insert_rank(
            RankingRelation::AlltimeRanks,
            RankRecord { article: 1, rank: 1, downloads: 500 },
        );
        store
    }

    #[tokio::test]
    async fn test_search_payload() {
        let params = SearchParams {
            q: "kinase".into(),
            ..Default::default()
        };
        let value = search(&store(), &EngineConfig::default(), &params)
            .await
            .unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["results"][0]["id"], 1);
        assert_eq!(value["results"][0]["metric_value"], 500);
    }

    #[tokio::test]
    async fn test_search_rejection_code() {
        let params = SearchParams {
            metric: "citations".into(),
            ..Default::default()
        };
        let err = search(&store(), &EngineConfig::default(), &params)
            .await
            .unwrap_err();
        assert_eq!(err.code(), CliErrorCode::InvalidRequest);
    }

    #[test]
    fn test_explain_payload() {
        let params = SearchParams {
            metric: "social".into(),
            timeframe: "week".into(),
            ..Default::default()
        };
        let value = explain(&EngineConfig::default(), &params).unwrap();
        assert_eq!(value["accepted"], true);
        assert_eq!(value["source"], "crossref_daily");
    }

    #[tokio::test]
    async fn test_categories_payload() {
        let value = categories(&store(), &EngineConfig::default()).await.unwrap();
        assert_eq!(value, json!({ "categories": ["genomics"] }));
    }
}
