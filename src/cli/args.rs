//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::request::SearchParams;

/// rxrank - ranked preprint search
#[derive(Parser, Debug)]
#[command(name = "rxrank")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a search and print one page of results
    Search(SearchArgs),

    /// Print the statements a search would run
    Explain(SearchArgs),

    /// List known categories
    Categories,

    /// Rank authors by downloads
    Authors {
        /// Restrict to one category
        #[arg(long)]
        category: Option<String>,
    },

    /// Download distribution for papers or authors
    Distribution {
        #[arg(default_value = "paper")]
        kind: String,
    },

    /// Indexing statistics
    Stats,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Free-text query
    #[arg(long, default_value = "")]
    pub query: String,

    /// Category filter, repeatable
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// downloads | social
    #[arg(long, default_value = "downloads")]
    pub metric: String,

    /// alltime, ytd, lastmonth (downloads); alltime, day, week, month, year (social)
    #[arg(long, default_value = "alltime")]
    pub timeframe: String,

    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    pub page: u32,

    #[arg(long)]
    pub page_size: Option<u32>,

    /// Read the parameters as one JSON object from stdin instead
    #[arg(long)]
    pub stdin: bool,
}

impl SearchArgs {
    pub fn to_params(&self) -> SearchParams {
        SearchParams {
            q: self.query.clone(),
            categories: self.categories.clone(),
            metric: self.metric.clone(),
            timeframe: self.timeframe.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
