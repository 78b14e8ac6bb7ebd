//! Store interface consumed by the search engine
//!
//! A [`Store`] hands out [`Session`]s. One session is one borrowed pooled
//! connection running a single read-only snapshot: every statement read
//! through it observes the same data version. Dropping a session releases
//! its connection whether or not [`Session::finish`] was called.
//!
//! Backends:
//! - [`PgStore`]: Postgres through an sqlx pool, `REPEATABLE READ READ ONLY`
//! - [`MemoryStore`]: immutable in-memory table snapshots

mod errors;
mod memory;
mod postgres;
mod row;
mod statement;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub use errors::{StoreError, StoreResult};
pub use memory::{
    ArticleRecord, AuthorRankRecord, AuthorRecord, DistributionRecord, MemorySession,
    MemoryStore, MemoryTables, MentionRecord, RankRecord,
};
pub use postgres::{PgSession, PgStore};
pub use row::{Row, Value};
pub use statement::{ArticleCount, LogicalRead, SqlParam, Statement};

/// Boxed future returned by store operations
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// A source of snapshot sessions
pub trait Store: Send + Sync {
    type Session: Session;

    /// Acquires a connection and opens a read-only snapshot on it.
    ///
    /// `statement_timeout` bounds every statement later read through the
    /// session.
    fn snapshot(&self, statement_timeout: Duration) -> StoreFuture<'_, Self::Session>;
}

/// One snapshot on one connection
pub trait Session: Send + 'static {
    /// Runs a statement and returns its rows in order
    fn read<'a>(&'a mut self, statement: &'a Statement) -> StoreFuture<'a, Vec<Row>>;

    /// Ends the snapshot and returns the connection
    fn finish(self) -> StoreFuture<'static, ()>
    where
        Self: Sized;
}
