//! Bin storage
//!
//! Bins are stored as parallel vectors (minima, maxima, heights, distinct
//! counts) so scans over one attribute stay cache-friendly. Lookup is binary
//! search: bins are ordered and non-overlapping by construction.

use std::cmp::Ordering;

use super::domain::HistogramValue;

/// Index of a bin within a histogram.
pub type BinId = usize;

/// Find the bin whose interval contains `value`, searching the parallel
/// `minima`/`maxima` slices. `None` means the value lies in a gap between
/// bins or outside the histogram's range.
pub(crate) fn bin_for_value_in<T: HistogramValue>(
    minima: &[T],
    maxima: &[T],
    value: &T,
) -> Option<BinId> {
    let candidate =
        maxima.partition_point(|max| max.cmp_values(value) == Ordering::Less);
    if candidate < minima.len()
        && minima[candidate].cmp_values(value) != Ordering::Greater
    {
        Some(candidate)
    } else {
        None
    }
}

/// Find the first bin whose minimum is strictly greater than `value`.
pub(crate) fn next_bin_for_value_in<T: HistogramValue>(
    minima: &[T],
    value: &T,
) -> Option<BinId> {
    let candidate =
        minima.partition_point(|min| min.cmp_values(value) != Ordering::Greater);
    (candidate < minima.len()).then_some(candidate)
}

/// Parallel-array bin storage shared by the explicit-height histograms.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSet<T> {
    minima: Vec<T>,
    maxima: Vec<T>,
    heights: Vec<u64>,
    distinct_counts: Vec<u64>,
    total_count: u64,
    total_distinct_count: u64,
}

impl<T: HistogramValue> BinSet<T> {
    pub fn new(
        minima: Vec<T>,
        maxima: Vec<T>,
        heights: Vec<u64>,
        distinct_counts: Vec<u64>,
    ) -> Self {
        debug_assert!(!minima.is_empty(), "a histogram needs at least one bin");
        debug_assert!(
            minima.len() == maxima.len()
                && minima.len() == heights.len()
                && minima.len() == distinct_counts.len(),
            "bin attribute vectors must have equal lengths"
        );
        debug_assert!(
            minima
                .iter()
                .zip(maxima.iter())
                .all(|(min, max)| min.cmp_values(max) != Ordering::Greater),
            "bin minimum above bin maximum"
        );
        debug_assert!(
            maxima
                .windows(2)
                .zip(minima.windows(2))
                .all(|(maxes, mins)| maxes[0].cmp_values(&mins[1]) == Ordering::Less),
            "bins must be ordered and non-overlapping"
        );

        let total_count = heights.iter().sum();
        let total_distinct_count = distinct_counts.iter().sum();
        BinSet {
            minima,
            maxima,
            heights,
            distinct_counts,
            total_count,
            total_distinct_count,
        }
    }

    pub fn len(&self) -> usize {
        self.minima.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minima.is_empty()
    }

    pub fn minimum(&self, id: BinId) -> &T {
        &self.minima[id]
    }

    pub fn maximum(&self, id: BinId) -> &T {
        &self.maxima[id]
    }

    pub fn height(&self, id: BinId) -> u64 {
        self.heights[id]
    }

    pub fn distinct_count(&self, id: BinId) -> u64 {
        self.distinct_counts[id]
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_distinct_count(&self) -> u64 {
        self.total_distinct_count
    }

    pub fn bin_for_value(&self, value: &T) -> Option<BinId> {
        bin_for_value_in(&self.minima, &self.maxima, value)
    }

    pub fn next_bin_for_value(&self, value: &T) -> Option<BinId> {
        next_bin_for_value_in(&self.minima, value)
    }
}
