//! rxrank - ranked preprint search
//!
//! Turns a search request (free text, categories, metric, timeframe, page)
//! into a consistent page of ranked preprints plus the total match count.
//!
//! Request flow:
//! 1. `request`: raw parameters validated into a `SearchRequest`
//! 2. `planner`: predicate fragments, metric source, count/page statements
//! 3. `store`: one snapshot session per search
//! 4. `executor`: count, then page, mapped into `ResultPage`
//!
//! `engine::QueryEngine` ties these together. `catalog` holds the other
//! site-level reads.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod executor;
pub mod observability;
pub mod planner;
pub mod request;
pub mod store;
