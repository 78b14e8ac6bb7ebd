//! Postgres store
//!
//! Each session is one pooled connection inside a
//! `REPEATABLE READ READ ONLY` transaction, so every statement it runs sees
//! the same snapshot. `statement_timeout` is set locally on that transaction
//! so the server cancels slow statements itself.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Postgres, Row as _, Transaction, TypeInfo};

use super::errors::{StoreError, StoreResult};
use super::row::{Row, Value};
use super::statement::{SqlParam, Statement};
use super::{Session, Store, StoreFuture};

/// Store backed by an sqlx Postgres pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects a pool. Acquiring a connection waits at most
    /// `acquire_timeout` before the store reports itself unavailable.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    type Session = PgSession;

    fn snapshot(&self, statement_timeout: Duration) -> StoreFuture<'_, PgSession> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(|e| match StoreError::from_sqlx(e) {
                StoreError::Query(msg) => StoreError::Unavailable(msg),
                other => other,
            })?;

            // Must run before any other statement in the transaction
            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_sqlx)?;

            // SET does not take bind parameters; the value is a plain integer
            let timeout_sql = format!(
                "SET LOCAL statement_timeout = {}",
                statement_timeout.as_millis().max(1)
            );
            sqlx::query(&timeout_sql)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_sqlx)?;

            Ok(PgSession { tx })
        })
    }
}

/// One snapshot transaction. Dropping it rolls back and returns the
/// connection to the pool.
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

impl Session for PgSession {
    fn read<'a>(&'a mut self, statement: &'a Statement) -> StoreFuture<'a, Vec<Row>> {
        Box::pin(async move {
            let mut query = sqlx::query(statement.text());
            for param in statement.params() {
                query = match param {
                    SqlParam::Text(s) => query.bind(s.clone()),
                    SqlParam::TextArray(values) => query.bind(values.clone()),
                    SqlParam::Int(n) => query.bind(*n),
                };
            }
            let rows = query
                .fetch_all(&mut *self.tx)
                .await
                .map_err(StoreError::from_sqlx)?;
            rows.iter().map(decode_row).collect()
        })
    }

    fn finish(self) -> StoreFuture<'static, ()> {
        // Read-only: nothing to commit
        Box::pin(async move { self.tx.rollback().await.map_err(StoreError::from_sqlx) })
    }
}

fn decode_row(row: &PgRow) -> StoreResult<Row> {
    let mut values = Vec::with_capacity(row.len());
    for column in row.columns() {
        let i = column.ordinal();
        let decoded = match column.type_info().name() {
            "INT2" => row
                .try_get::<Option<i16>, _>(i)
                .map(|v| v.map_or(Value::Null, |v| Value::Int(i64::from(v)))),
            "INT4" => row
                .try_get::<Option<i32>, _>(i)
                .map(|v| v.map_or(Value::Null, |v| Value::Int(i64::from(v)))),
            "INT8" => row
                .try_get::<Option<i64>, _>(i)
                .map(|v| v.map_or(Value::Null, Value::Int)),
            "BOOL" => row
                .try_get::<Option<bool>, _>(i)
                .map(|v| v.map_or(Value::Null, Value::Bool)),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(i)
                .map(|v| v.map_or(Value::Null, |v| Value::Float(f64::from(v)))),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(i)
                .map(|v| v.map_or(Value::Null, Value::Float)),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row
                .try_get::<Option<String>, _>(i)
                .map(|v| v.map_or(Value::Null, Value::Text)),
            "DATE" => row
                .try_get::<Option<NaiveDate>, _>(i)
                .map(|v| v.map_or(Value::Null, Value::Date)),
            "TIMESTAMPTZ" => row
                .try_get::<Option<DateTime<Utc>>, _>(i)
                .map(|v| v.map_or(Value::Null, Value::Timestamp)),
            "TIMESTAMP" => row
                .try_get::<Option<NaiveDateTime>, _>(i)
                .map(|v| v.map_or(Value::Null, |v| Value::Timestamp(v.and_utc()))),
            other => {
                return Err(StoreError::Decode(format!(
                    "unsupported column type {} for '{}'",
                    other,
                    column.name()
                )))
            }
        };
        values.push(decoded.map_err(StoreError::from_sqlx)?);
    }
    Ok(Row::new(values))
}
