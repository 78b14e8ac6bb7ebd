//! Search request model
//!
//! The endpoint layer hands over loosely-typed [`SearchParams`]. Validation
//! turns them into an immutable [`SearchRequest`] or rejects them with a
//! [`ValidationError`] before any statement is built or any store is touched.
//!
//! # Valid metric/timeframe combinations
//!
//! | metric      | timeframes                              |
//! |-------------|-----------------------------------------|
//! | `downloads` | `alltime`, `ytd`, `lastmonth`           |
//! | `social`    | `alltime`, `day`, `week`, `month`, `year` |

mod errors;
mod params;
mod types;

pub use errors::{ValidationError, ValidationErrorCode, ValidationResult};
pub use params::{PageLimits, Pagination, SearchParams, SearchRequest};
pub use types::{Metric, Timeframe};
