//! Run-length compressed table associating values with sparse index spans.
//!
//! The table is the canonical run-length encoding of an index-to-value
//! mapping over a huge integer index space: only maximal contiguous runs
//! sharing a value are stored, so memory scales with the number of runs
//! rather than the number of indexes. Queries locate runs by binary search,
//! and the index-shifting mutations model insertion and removal of rows in
//! the backing collection.

use std::slice;

use smallvec::SmallVec;

use super::iter::Indexes;
use super::range::IndexRange;

/// Run lists this small live inline without touching the heap.
const INLINE_RUNS: usize = 8;

/// Position of an index relative to the run list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// The run at this position covers the index.
    Covering(usize),
    /// No run covers the index; the run at this position is the nearest one below.
    After(usize),
    /// The index precedes every run in the table.
    BeforeAll,
}

/// Maps index spans of a large virtualized collection to values of type `T`.
///
/// The run list always satisfies the canonical form: runs are sorted
/// ascending by lower bound and pairwise disjoint, and touching runs never
/// carry equal values (those are always a single run). Every public mutation
/// re-establishes this form before returning.
///
/// `clone()` deep-copies the run list; the two tables are fully independent
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct IndexToValueTable<T> {
    runs: SmallVec<[IndexRange<T>; INLINE_RUNS]>,
}

impl<T> IndexToValueTable<T> {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            runs: SmallVec::new(),
        }
    }

    /// Returns true if the table covers no indexes.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of runs in the table.
    pub fn range_count(&self) -> usize {
        self.runs.len()
    }

    /// Total number of indexes covered by the table.
    pub fn index_count(&self) -> usize {
        self.runs.iter().map(IndexRange::count).sum()
    }

    /// Remove every run from the table.
    pub fn clear(&mut self) {
        self.runs.clear();
    }

    /// Iterate over the runs in ascending order.
    pub fn iter(&self) -> slice::Iter<'_, IndexRange<T>> {
        self.runs.iter()
    }

    /// Returns the run covering the given index, if any.
    pub fn range_at(&self, index: usize) -> Option<&IndexRange<T>> {
        match self.locate(index) {
            Slot::Covering(pos) => Some(&self.runs[pos]),
            _ => None,
        }
    }

    /// Returns the value at the given index, or `None` if no run covers it.
    pub fn value_at(&self, index: usize) -> Option<&T> {
        self.range_at(index).map(|run| &run.value)
    }

    /// Returns true if some run covers the given index.
    pub fn contains(&self, index: usize) -> bool {
        matches!(self.locate(index), Slot::Covering(_))
    }

    /// Returns true if every index in `[lower_bound, upper_bound]` is covered
    /// with no gap anywhere in the span.
    pub fn contains_all(&self, lower_bound: usize, upper_bound: usize) -> bool {
        debug_assert!(lower_bound <= upper_bound, "inverted bounds");
        if upper_bound < lower_bound {
            return false;
        }

        let mut pos = match self.locate(lower_bound) {
            Slot::Covering(pos) => pos,
            _ => return false,
        };
        while self.runs[pos].upper_bound < upper_bound {
            let next = pos + 1;
            if next >= self.runs.len()
                || self.runs[next].lower_bound != self.runs[pos].upper_bound + 1
            {
                return false;
            }
            pos = next;
        }
        true
    }

    /// Number of covered indexes in the inclusive span `[lower_bound, upper_bound]`.
    pub fn index_count_in(&self, lower_bound: usize, upper_bound: usize) -> usize {
        debug_assert!(lower_bound <= upper_bound, "inverted bounds");
        if upper_bound < lower_bound {
            return 0;
        }

        let mut count = 0;
        for run in &self.runs[self.first_run_at_or_after(lower_bound)..] {
            if run.lower_bound > upper_bound {
                break;
            }
            count += run.upper_bound.min(upper_bound) - run.lower_bound.max(lower_bound) + 1;
        }
        count
    }

    /// Number of covered indexes strictly below the given index.
    ///
    /// For a covered index this is its 0-based ordinal among all covered
    /// indexes. Linear in the number of runs preceding the index.
    pub fn index_of(&self, index: usize) -> usize {
        let mut ordinal = 0;
        for run in &self.runs {
            if run.upper_bound < index {
                ordinal += run.count();
            } else {
                if run.lower_bound < index {
                    ordinal += index - run.lower_bound;
                }
                break;
            }
        }
        ordinal
    }

    /// Absolute index of the n-th covered index in ascending order, or `None`
    /// if fewer than `n + 1` indexes are covered.
    pub fn nth_index(&self, n: usize) -> Option<usize> {
        let mut remaining = n;
        for run in &self.runs {
            if remaining < run.count() {
                return Some(run.lower_bound + remaining);
            }
            remaining -= run.count();
        }
        None
    }

    /// Nearest covered index strictly greater than the given index.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        let target = index + 1;
        match self.locate(target) {
            Slot::Covering(_) => Some(target),
            Slot::After(pos) => self.runs.get(pos + 1).map(|run| run.lower_bound),
            Slot::BeforeAll => self.runs.first().map(|run| run.lower_bound),
        }
    }

    /// Nearest covered index strictly less than the given index.
    pub fn previous_index(&self, index: usize) -> Option<usize> {
        let target = index.checked_sub(1)?;
        match self.locate(target) {
            Slot::Covering(_) => Some(target),
            Slot::After(pos) => Some(self.runs[pos].upper_bound),
            Slot::BeforeAll => None,
        }
    }

    /// Nearest uncovered index strictly greater than the given index,
    /// skipping over contiguously covered runs.
    pub fn next_gap(&self, index: usize) -> usize {
        let target = index + 1;
        match self.locate(target) {
            Slot::Covering(mut pos) => {
                while pos + 1 < self.runs.len()
                    && self.runs[pos + 1].lower_bound == self.runs[pos].upper_bound + 1
                {
                    pos += 1;
                }
                self.runs[pos].upper_bound + 1
            }
            _ => target,
        }
    }

    /// Nearest uncovered index strictly less than the given index, skipping
    /// over contiguously covered runs. `None` when no such index exists.
    pub fn previous_gap(&self, index: usize) -> Option<usize> {
        let target = index.checked_sub(1)?;
        match self.locate(target) {
            Slot::Covering(mut pos) => {
                while pos > 0
                    && self.runs[pos - 1].upper_bound + 1 == self.runs[pos].lower_bound
                {
                    pos -= 1;
                }
                self.runs[pos].lower_bound.checked_sub(1)
            }
            _ => Some(target),
        }
    }

    /// Lazily iterate every covered index in ascending order.
    pub fn indexes(&self) -> Indexes<'_, T> {
        Indexes::new(&self.runs)
    }

    /// Lazily iterate every covered index at or after `start_index`.
    pub fn indexes_from(&self, start_index: usize) -> Indexes<'_, T> {
        let first = self.first_run_at_or_after(start_index);
        Indexes::starting_at(&self.runs[first..], start_index)
    }

    /// Walk forward over uncovered indexes.
    ///
    /// Let `g0, g1, g2, ...` enumerate the uncovered indexes at or after
    /// `index` in ascending order (`g0` is `index` itself when `index` is
    /// uncovered). Returns `g_count`. Covered runs are skipped without
    /// materializing the gaps between them.
    pub fn count_next_not_included(&self, index: usize, count: usize) -> usize {
        let (mut result, start) = match self.locate(index) {
            Slot::Covering(pos) => (self.runs[pos].upper_bound + 1, pos + 1),
            Slot::After(pos) => (index, pos + 1),
            Slot::BeforeAll => (index, 0),
        };
        let mut remaining = count;
        for run in &self.runs[start..] {
            let gap = run.lower_bound - result;
            if gap > remaining {
                return result + remaining;
            }
            remaining -= gap;
            result = run.upper_bound + 1;
        }
        result + remaining
    }

    /// Walk backward over uncovered indexes; exact mirror of
    /// [`count_next_not_included`](Self::count_next_not_included).
    ///
    /// Returns `None` when fewer than `count + 1` uncovered indexes exist at
    /// or below `index`.
    pub fn count_previous_not_included(&self, index: usize, count: usize) -> Option<usize> {
        let (mut result, mut below) = match self.locate(index) {
            Slot::Covering(pos) => {
                (self.runs[pos].lower_bound.checked_sub(1)?, pos.checked_sub(1))
            }
            Slot::After(pos) => (index, Some(pos)),
            Slot::BeforeAll => (index, None),
        };
        let mut remaining = count;
        loop {
            let floor = match below {
                Some(pos) => self.runs[pos].upper_bound + 1,
                None => 0,
            };
            // Uncovered stretch is [floor, result]; empty when the run below
            // touches the one we just crossed.
            let gap = (result + 1).saturating_sub(floor);
            if gap > remaining {
                return Some(result - remaining);
            }
            let pos = below?;
            remaining -= gap;
            result = self.runs[pos].lower_bound.checked_sub(1)?;
            below = pos.checked_sub(1);
        }
    }

    /// Count covered indexes reachable from `starting_index` before hitting
    /// an uncovered stretch of at least `gap_size` indexes.
    ///
    /// A `gap_size` of zero degenerates to "stop at the first real gap"; a
    /// zero-length gap is not a gap.
    pub fn index_count_before_gap(&self, starting_index: usize, gap_size: usize) -> usize {
        let mut count = 0;
        let mut current = starting_index;
        for run in &self.runs[self.first_run_at_or_after(starting_index)..] {
            let gap = run.lower_bound.saturating_sub(current);
            if gap > 0 && gap >= gap_size {
                break;
            }
            count += run.upper_bound - run.lower_bound.max(current) + 1;
            current = run.upper_bound + 1;
        }
        count
    }

    /// Diagnostic snapshot of the table.
    pub fn stats(&self) -> TableStats {
        TableStats {
            range_count: self.runs.len(),
            index_count: self.index_count(),
            memory_usage: self.runs.capacity() * std::mem::size_of::<IndexRange<T>>(),
        }
    }

    /// Index of the first run whose upper bound is at or after `index`.
    fn first_run_at_or_after(&self, index: usize) -> usize {
        self.runs.partition_point(|run| run.upper_bound < index)
    }

    /// Binary search for the run containing `index`; O(log R) in the number
    /// of runs.
    fn locate(&self, index: usize) -> Slot {
        let pos = self.first_run_at_or_after(index);
        if pos < self.runs.len() && self.runs[pos].lower_bound <= index {
            Slot::Covering(pos)
        } else if pos == 0 {
            Slot::BeforeAll
        } else {
            Slot::After(pos - 1)
        }
    }
}

impl<T: PartialEq> IndexToValueTable<T> {
    /// Returns true if a run covers the given index and carries the given value.
    pub fn contains_index_and_value(&self, index: usize, value: &T) -> bool {
        match self.locate(index) {
            Slot::Covering(pos) => self.runs[pos].contains_value(value),
            _ => false,
        }
    }

    /// Number of indexes in `[lower_bound, upper_bound]` covered with the
    /// given value.
    pub fn index_count_of_value(&self, lower_bound: usize, upper_bound: usize, value: &T) -> usize {
        debug_assert!(lower_bound <= upper_bound, "inverted bounds");
        if upper_bound < lower_bound {
            return 0;
        }

        let mut count = 0;
        for run in &self.runs[self.first_run_at_or_after(lower_bound)..] {
            if run.lower_bound > upper_bound {
                break;
            }
            if run.contains_value(value) {
                count +=
                    run.upper_bound.min(upper_bound) - run.lower_bound.max(lower_bound) + 1;
            }
        }
        count
    }

    /// Check the canonical-form invariants of the run list.
    ///
    /// Every public mutation leaves the table valid; this exists for
    /// diagnostics and tests.
    pub fn validate(&self) -> TableResult<()> {
        for (pos, run) in self.runs.iter().enumerate() {
            if run.upper_bound < run.lower_bound {
                return Err(TableError::EmptyRange);
            }
            if pos > 0 {
                let previous = &self.runs[pos - 1];
                if previous.upper_bound >= run.lower_bound {
                    return Err(TableError::UnsortedRanges);
                }
                if previous.upper_bound + 1 == run.lower_bound && previous.value == run.value {
                    return Err(TableError::UnmergedRanges);
                }
            }
        }
        Ok(())
    }
}

impl<T: Clone + PartialEq> IndexToValueTable<T> {
    /// Assign a value to a single index.
    pub fn add_value(&mut self, index: usize, value: T) -> TableResult<()> {
        self.add_values(index, 1, value)
    }

    /// Assign `value` to every index in `[start_index, start_index + count)`.
    ///
    /// Indexes do not move; existing runs overlapped by the span are
    /// overwritten, trimmed, or split, and the new run merges with
    /// value-equal neighbors. Re-applying the same assignment is a no-op.
    pub fn add_values(&mut self, start_index: usize, count: usize, value: T) -> TableResult<()> {
        if count == 0 {
            return Err(TableError::InvalidCount);
        }
        let end_index = start_index + count - 1;

        if self.runs.is_empty() {
            self.runs.push(IndexRange::new(start_index, end_index, value));
            return Ok(());
        }

        let lower = match self.locate(start_index) {
            Slot::BeforeAll => {
                self.runs
                    .insert(0, IndexRange::new(start_index, end_index, value));
                0
            }
            Slot::After(pos) => {
                self.runs
                    .insert(pos + 1, IndexRange::new(start_index, end_index, value));
                if self.merge_at(pos) { pos } else { pos + 1 }
            }
            Slot::Covering(pos) => {
                if self.runs[pos].value == value {
                    self.runs
                        .insert(pos + 1, IndexRange::new(start_index, end_index, value));
                    if self.merge_at(pos) { pos } else { pos + 1 }
                } else {
                    // The covering run holds a different value: split it at
                    // start_index, keeping any remainder above the new span.
                    let old_upper = self.runs[pos].upper_bound;
                    if old_upper > end_index {
                        let tail = IndexRange::new(
                            end_index + 1,
                            old_upper,
                            self.runs[pos].value.clone(),
                        );
                        self.runs.insert(pos + 1, tail);
                    }
                    let insert_at = if self.runs[pos].lower_bound == start_index {
                        self.runs.remove(pos);
                        pos
                    } else {
                        self.runs[pos].upper_bound = start_index - 1;
                        pos + 1
                    };
                    self.runs
                        .insert(insert_at, IndexRange::new(start_index, end_index, value));
                    insert_at
                }
            }
        };

        // Drop runs the new span swallowed and trim one partially covered at
        // its upper end, then restore adjacency at the upper seam.
        let upper = lower + 1;
        while upper < self.runs.len() && self.runs[upper].upper_bound <= end_index {
            self.runs.remove(upper);
        }
        if upper < self.runs.len() && self.runs[upper].lower_bound <= end_index {
            self.runs[upper].lower_bound = end_index + 1;
        }
        self.merge_at(lower);
        if lower > 0 {
            self.merge_at(lower - 1);
        }
        Ok(())
    }

    /// Clear the value association of a single index without moving any index.
    pub fn remove_value(&mut self, index: usize) -> TableResult<()> {
        self.remove_values(index, 1)
    }

    /// Clear value associations over `[start_index, start_index + count)`
    /// without moving any other index.
    ///
    /// A run strictly containing the span is split in two; runs emptied by
    /// the trim are deleted. Clearing a gap is a no-op.
    pub fn remove_values(&mut self, start_index: usize, count: usize) -> TableResult<()> {
        if count == 0 {
            return Err(TableError::InvalidCount);
        }
        let end = start_index + count;

        let mut pos = self.first_run_at_or_after(start_index);
        if pos >= self.runs.len() || self.runs[pos].lower_bound >= end {
            return Ok(());
        }

        if self.runs[pos].lower_bound < start_index {
            // The run extends below the span: keep the head as its own run.
            let head = IndexRange::new(
                self.runs[pos].lower_bound,
                start_index - 1,
                self.runs[pos].value.clone(),
            );
            self.runs.insert(pos, head);
            pos += 1;
        }

        // Advance the first overlapped run past the span, dropping it if emptied.
        if self.runs[pos].upper_bound < end {
            self.runs.remove(pos);
        } else {
            self.runs[pos].lower_bound = end;
            pos += 1;
        }

        while pos < self.runs.len() && self.runs[pos].upper_bound < end {
            self.runs.remove(pos);
        }
        if pos < self.runs.len() && self.runs[pos].lower_bound < end {
            self.runs[pos].lower_bound = end;
        }
        Ok(())
    }

    /// Insert one value-less index, shifting every index at or after it up by one.
    pub fn insert_index(&mut self, index: usize) -> TableResult<()> {
        self.insert_indexes(index, 1)
    }

    /// Insert `count` value-less indexes at `start_index`.
    ///
    /// Every existing index at or after `start_index` shifts up by `count`.
    /// A run straddling `start_index` splits; the upper half keeps the run's
    /// value at its shifted position while the inserted indexes themselves
    /// stay uncovered.
    pub fn insert_indexes(&mut self, start_index: usize, count: usize) -> TableResult<()> {
        if count == 0 {
            return Err(TableError::InvalidCount);
        }

        let mut pos = self.first_run_at_or_after(start_index);
        if pos < self.runs.len() && self.runs[pos].lower_bound < start_index {
            // Straddling run: split it at the insertion point.
            let old_upper = self.runs[pos].upper_bound;
            let tail_value = self.runs[pos].value.clone();
            self.runs[pos].upper_bound = start_index - 1;
            self.runs.insert(
                pos + 1,
                IndexRange::new(start_index + count, old_upper + count, tail_value),
            );
            pos += 2;
        }
        for run in &mut self.runs[pos..] {
            run.lower_bound += count;
            run.upper_bound += count;
        }
        Ok(())
    }

    /// Insert one index carrying a value.
    pub fn insert_index_and_value(&mut self, index: usize, value: T) -> TableResult<()> {
        self.insert_indexes_and_values(index, 1, value)
    }

    /// Insert `count` indexes at `start_index`, then assign `value` to the
    /// newly opened span.
    ///
    /// The shift runs first so that merge decisions see the final positions
    /// of the neighboring runs.
    pub fn insert_indexes_and_values(
        &mut self,
        start_index: usize,
        count: usize,
        value: T,
    ) -> TableResult<()> {
        self.insert_indexes(start_index, count)?;
        self.add_values(start_index, count, value)
    }

    /// Delete one index, shifting every surviving index above it down by one.
    pub fn remove_index(&mut self, index: usize) -> TableResult<()> {
        self.remove_indexes(index, 1)
    }

    /// Delete `count` indexes starting at `start_index`.
    ///
    /// Value associations of the removed indexes are discarded; every
    /// surviving index at or after `start_index + count` shifts down by
    /// `count`. Shifting can bring two previously separated, value-equal
    /// runs into adjacency, which is merged at the seam.
    pub fn remove_indexes(&mut self, start_index: usize, count: usize) -> TableResult<()> {
        if count == 0 {
            return Err(TableError::InvalidCount);
        }
        let end = start_index + count;

        let anchor = self.first_run_at_or_after(start_index);
        let mut pos = anchor;
        while pos < self.runs.len() {
            let (lower, upper) = (self.runs[pos].lower_bound, self.runs[pos].upper_bound);
            if lower >= end {
                // Entirely above the removed span: shift down.
                self.runs[pos].lower_bound = lower - count;
                self.runs[pos].upper_bound = upper - count;
                pos += 1;
            } else if lower < start_index {
                // Extends below the span: keep the head, shift any surviving tail.
                self.runs[pos].upper_bound = start_index - 1;
                if upper >= end {
                    let tail = IndexRange::new(
                        start_index,
                        upper - count,
                        self.runs[pos].value.clone(),
                    );
                    self.runs.insert(pos + 1, tail);
                    pos += 2;
                } else {
                    pos += 1;
                }
            } else if upper >= end {
                // Head swallowed by the span, tail survives shifted.
                self.runs[pos].lower_bound = start_index;
                self.runs[pos].upper_bound = upper - count;
                pos += 1;
            } else {
                // Entirely within the removed span.
                self.runs.remove(pos);
            }
        }

        // At most one new adjacency can appear, at the removal seam.
        let seam = anchor.saturating_sub(1);
        if !self.merge_at(seam) && !self.merge_at(seam + 1) {
            self.merge_at(seam + 2);
        }
        Ok(())
    }

    /// Delete one index together with its value association.
    pub fn remove_index_and_value(&mut self, index: usize) -> TableResult<()> {
        self.remove_indexes_and_values(index, 1)
    }

    /// Delete `count` indexes starting at `start_index` together with their
    /// value associations.
    ///
    /// Values are cleared first, while bounds still refer to pre-shift
    /// positions, then the indexes are removed.
    pub fn remove_indexes_and_values(&mut self, start_index: usize, count: usize) -> TableResult<()> {
        self.remove_values(start_index, count)?;
        self.remove_indexes(start_index, count)
    }

    /// Merge the run at `lower` with its successor if they touch or overlap
    /// and carry equal values. Returns true if a merge happened.
    fn merge_at(&mut self, lower: usize) -> bool {
        let upper = lower + 1;
        if upper >= self.runs.len() {
            return false;
        }
        if self.runs[lower].upper_bound + 1 >= self.runs[upper].lower_bound
            && self.runs[lower].value == self.runs[upper].value
        {
            let merged_upper = self.runs[lower].upper_bound.max(self.runs[upper].upper_bound);
            self.runs[lower].upper_bound = merged_upper;
            self.runs.remove(upper);
            return true;
        }
        false
    }
}

impl<T> Default for IndexToValueTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a IndexToValueTable<T> {
    type Item = &'a IndexRange<T>;
    type IntoIter = slice::Iter<'a, IndexRange<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.iter()
    }
}

/// Errors reported by table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// A count parameter was zero where the operation requires at least one index.
    InvalidCount,
    /// Validation found a run whose upper bound is below its lower bound.
    EmptyRange,
    /// Validation found runs out of order or overlapping.
    UnsortedRanges,
    /// Validation found adjacent runs carrying equal values.
    UnmergedRanges,
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::InvalidCount => write!(f, "count must be greater than zero"),
            TableError::EmptyRange => write!(f, "range with inverted bounds"),
            TableError::UnsortedRanges => write!(f, "ranges out of order or overlapping"),
            TableError::UnmergedRanges => write!(f, "adjacent ranges with equal values"),
        }
    }
}

impl std::error::Error for TableError {}

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Statistics about a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    /// Number of runs in the table.
    pub range_count: usize,
    /// Total number of covered indexes.
    pub index_count: usize,
    /// Bytes reserved for the run list.
    pub memory_usage: usize,
}
