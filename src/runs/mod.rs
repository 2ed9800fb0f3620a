//! Run-length compressed index-to-value mapping.
//!
//! This module provides the table that virtualized collections use to tag
//! subsets of a huge row or column index space with values (group ids,
//! visibility flags, frozen markers) without allocating one slot per index.

pub mod iter;
pub mod range;
pub mod table;

// Re-export key types
pub use iter::Indexes;
pub use range::IndexRange;
pub use table::{IndexToValueTable, TableError, TableResult, TableStats};
