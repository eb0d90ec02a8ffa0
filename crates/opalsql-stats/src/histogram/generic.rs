//! Explicit-bin histogram
//!
//! No layout constraint: bins are whatever the caller provides. This is the
//! output type of `slice_with_predicate` and a convenient fixture for tests.

use super::bins::{BinId, BinSet};
use super::domain::HistogramValue;
use super::estimator::Histogram;

#[derive(Debug, Clone, PartialEq)]
pub struct GenericHistogram<T: HistogramValue> {
    bins: BinSet<T>,
    domain: T::Domain,
}

impl<T: HistogramValue> GenericHistogram<T> {
    /// Build from explicit parallel bin vectors. Bins must be sorted and
    /// non-overlapping.
    pub fn new(
        minima: Vec<T>,
        maxima: Vec<T>,
        heights: Vec<u64>,
        distinct_counts: Vec<u64>,
        domain: T::Domain,
    ) -> Self {
        GenericHistogram { bins: BinSet::new(minima, maxima, heights, distinct_counts), domain }
    }
}

impl<T: HistogramValue> Histogram<T> for GenericHistogram<T> {
    fn domain(&self) -> &T::Domain {
        &self.domain
    }

    fn bin_count(&self) -> usize {
        self.bins.len()
    }

    fn bin_minimum(&self, id: BinId) -> &T {
        self.bins.minimum(id)
    }

    fn bin_maximum(&self, id: BinId) -> &T {
        self.bins.maximum(id)
    }

    fn bin_height(&self, id: BinId) -> u64 {
        self.bins.height(id)
    }

    fn bin_distinct_count(&self, id: BinId) -> u64 {
        self.bins.distinct_count(id)
    }

    fn bin_for_value(&self, value: &T) -> Option<BinId> {
        self.bins.bin_for_value(value)
    }

    fn next_bin_for_value(&self, value: &T) -> Option<BinId> {
        self.bins.next_bin_for_value(value)
    }

    fn total_count(&self) -> u64 {
        self.bins.total_count()
    }

    fn total_distinct_count(&self) -> u64 {
        self.bins.total_distinct_count()
    }

    fn layout_name(&self) -> &'static str {
        "Generic"
    }

    fn boxed_clone(&self) -> Box<dyn Histogram<T> + Send + Sync> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let histogram = GenericHistogram::new(
            vec![1i32, 20],
            vec![10, 30],
            vec![8, 12],
            vec![4, 6],
            (),
        );
        assert_eq!(histogram.bin_count(), 2);
        assert_eq!(*histogram.minimum(), 1);
        assert_eq!(*histogram.maximum(), 30);
        assert_eq!(histogram.total_count(), 20);
        assert_eq!(histogram.total_distinct_count(), 10);
        assert_eq!(histogram.bin_width(0), 10.0);
    }

    #[test]
    fn test_description_lists_bins() {
        let histogram =
            GenericHistogram::new(vec![1i32, 20], vec![10, 30], vec![8, 12], vec![4, 6], ());
        let description = histogram.description();
        assert!(description.starts_with("Generic"));
        assert!(description.contains("[1, 10]: 8"));
        assert!(description.contains("[20, 30]: 12"));
    }
}
