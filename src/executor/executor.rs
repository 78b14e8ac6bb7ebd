//! Count-then-page execution on one session

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::planner::AssembledQuery;
use crate::store::{Row, Session, Statement, StoreError, StoreResult, Value};

use super::errors::{ExecutorError, ExecutorResult};
use super::result::{RankedResult, ResultPage};

/// One time budget shared by every step of an operation: acquiring the
/// snapshot and each statement read on it.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    budget: Duration,
    at: Instant,
}

impl Deadline {
    /// Starts the clock now
    pub fn after(budget: Duration) -> Self {
        Self {
            budget,
            at: Instant::now() + budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the budget runs out, zero once it has
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Runs `step`, failing with a store timeout once the budget is spent.
    pub async fn run<T, F>(&self, step: &str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match timeout_at(self.at, fut).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StoreError::Timeout(format!(
                "{} not done within the {}ms budget",
                step,
                self.budget.as_millis()
            ))),
        }
    }
}

/// Runs one statement within what is left of `deadline`.
///
/// The server-side statement timeout still bounds each statement; this
/// bounds the operation as a whole.
pub async fn read_with_deadline<S: Session>(
    session: &mut S,
    statement: &Statement,
    deadline: &Deadline,
) -> ExecutorResult<Vec<Row>> {
    let remaining_ms = deadline.remaining().as_millis() as u64;
    debug!(statement = %statement, remaining_ms, "executing statement");
    deadline
        .run("statement", session.read(statement))
        .await
        .map_err(ExecutorError::store)
}

/// First column of the first row as a non-negative count; zero otherwise
pub fn extract_count(rows: &[Row]) -> u64 {
    rows.first()
        .and_then(|row| row.get(0))
        .and_then(Value::as_i64)
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

/// Executes assembled search queries
#[derive(Debug, Clone, Copy)]
pub struct SearchExecutor {
    deadline: Deadline,
}

impl SearchExecutor {
    pub fn new(deadline: Deadline) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    /// Count first, then the page, both on `session`. The page only gets
    /// what the count left of the budget.
    pub async fn execute<S: Session>(
        &self,
        session: &mut S,
        query: &AssembledQuery,
    ) -> ExecutorResult<ResultPage> {
        let count_rows = read_with_deadline(session, query.count(), &self.deadline).await?;
        let total = extract_count(&count_rows);

        let page_rows = read_with_deadline(session, query.page(), &self.deadline).await?;
        let arity = query.page_arity();
        let results = page_rows
            .iter()
            .map(|row| RankedResult::from_row(row, arity))
            .collect::<ExecutorResult<Vec<_>>>()?;

        check_total(total, query.pagination().offset(), results.len())?;
        debug!(total, returned = results.len(), "search executed");
        Ok(ResultPage::new(results, total))
    }
}

/// A snapshot cannot return rows past its own total, nor an empty first
/// page for a non-empty result set.
fn check_total(total: u64, offset: u64, returned: usize) -> ExecutorResult<()> {
    let shown = offset.saturating_add(returned as u64);
    let overrun = returned > 0 && total < shown;
    let missing = returned == 0 && offset == 0 && total > 0;
    if overrun || missing {
        return Err(ExecutorError::inconsistent_total(total, offset, returned));
    }
    Ok(())
}
