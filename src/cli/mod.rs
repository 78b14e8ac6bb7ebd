//! CLI module for rxrank
//!
//! Commands:
//! - search: one ranked page as JSON
//! - explain: the statements a search would run, without a database
//! - categories, authors, distribution, stats: catalog reads

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, SearchArgs};
pub use commands::{
    authors, categories, distribution, explain, run, run_command, search, stats,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
