//! Query engine facade
//!
//! `QueryEngine::search` is the one entry point callers use. It validates the
//! raw request before touching the store, plans the count/page pair, then
//! runs both statements on one snapshot session with the configured
//! deadline.
//!
//! The metric source table is validated when the engine is built, so a
//! request can never reach an unmapped (metric, timeframe) pair at runtime.

mod errors;
mod query_engine;

pub use errors::{SearchError, SearchResult};
pub use query_engine::{QueryEngine, SearchOptions};
