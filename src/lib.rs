//! RunTable: run-length compressed index-to-value tables
//!
//! This crate provides the compressed range map that virtualized collections
//! (grid rows and columns, grouped or filtered datasets) use to associate a
//! value with subsets of a potentially huge integer index space. Only maximal
//! contiguous runs sharing a value are stored, so a table over millions of
//! rows costs memory proportional to the number of runs, and lookups cost
//! O(log R) in the number of runs.
//!
//! Two kinds of mutation are supported: value assignment, which never moves
//! an index, and index insertion/removal, which shifts every subsequent run
//! to model rows entering or leaving the backing collection. Every mutation
//! leaves the run list in canonical form: sorted and disjoint, with touching
//! equal-valued runs collapsed into one.
//!
//! ```
//! use runtable::IndexToValueTable;
//!
//! let mut groups = IndexToValueTable::new();
//! groups.add_values(0, 10, "fruit").unwrap();
//! groups.add_values(10, 5, "vegetable").unwrap();
//!
//! // Two rows are inserted inside the first group.
//! groups.insert_indexes_and_values(4, 2, "fruit").unwrap();
//!
//! assert_eq!(groups.value_at(11), Some(&"fruit"));
//! assert_eq!(groups.value_at(12), Some(&"vegetable"));
//! assert_eq!(groups.index_count(), 17);
//! ```

#![warn(missing_docs)]

pub mod runs;

// Re-exports
pub use runs::iter::Indexes;
pub use runs::range::IndexRange;
pub use runs::table::{IndexToValueTable, TableError, TableResult, TableStats};
