//! Execution and materialization
//!
//! Runs an assembled query on one snapshot session and maps rows into
//! results.
//!
//! # Execution flow (strict order)
//!
//! 1. Read the count statement; a missing or malformed count is zero
//! 2. Read the page statement on the same session
//! 3. Map each row positionally into a [`RankedResult`]
//! 4. Check the total against the page before returning it
//!
//! Every read is bounded by what is left of one [`Deadline`] shared by the
//! whole operation. A row whose shape does
//! not match the projection is fatal: it means the statement and the mapper
//! disagree, which no retry can fix.

mod errors;
mod executor;
mod reader;
mod result;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use executor::{extract_count, read_with_deadline, Deadline, SearchExecutor};
pub use reader::RowReader;
pub use result::{RankedResult, ResultPage};
