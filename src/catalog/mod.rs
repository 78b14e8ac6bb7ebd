//! Catalog reads
//!
//! Site-level listings next to search: categories, author rankings, the
//! download distribution and indexing statistics. Each call runs all of its
//! statements on one snapshot session, like a search does.

mod catalog;
mod statements;
mod types;

pub use catalog::{Catalog, CatalogOptions};
pub use statements::{
    author_ranks, categories, distribution, distribution_value, DISTRIBUTION_KINDS,
};
pub use types::{Distribution, DistributionBucket, RankedAuthor, SiteStats};
