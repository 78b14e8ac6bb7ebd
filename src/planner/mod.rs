//! Query planner for ranked search
//!
//! Turns a validated search request into a pair of statements that filter
//! identically: one counts every matching article, the other fetches one
//! ordered page of them.
//!
//! # Pipeline (strict order)
//!
//! 1. [`PredicateBuilder`]: request → predicate fragments (data, not SQL)
//! 2. [`MetricSourceTable`]: (metric, timeframe) → ranking relation + ordering
//! 3. [`QueryAssembler`]: fragments + source + pagination → count/page statements
//!
//! The assembler is the only place SQL text is produced. User input only
//! ever reaches a statement as a bound parameter.
//!
//! # Canonical fragment order
//!
//! text → positive-downloads → category → time-window, whatever order the
//! request listed its filters in.

mod assembler;
mod errors;
mod explain;
mod predicate;
mod source;

pub use assembler::{AssembledQuery, QueryAssembler, SearchFilter, PAGE_COLUMNS};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult};
pub use explain::ExplainPlan;
pub use predicate::{lookback_days, PredicateBuilder, PredicateFragment, PredicateKind, TEXT_VECTORS};
pub use source::{JoinKey, MetricSource, MetricSourceTable, RankingRelation, SortDirection};
