//! Equal-width layout
//!
//! Splits the span between the smallest and largest value into bins of
//! (nearly) equal width in the value domain and counts what falls into each.
//! Unlike the other layouts a bin can be empty; the estimation engine treats
//! runs of empty bins as prunable ranges.

use std::cmp::Ordering;

use crate::error::StatsError;

use super::bins::{BinId, BinSet};
use super::domain::HistogramValue;
use super::estimator::Histogram;
use super::value_distribution::gather_value_distribution;

#[derive(Debug, Clone, PartialEq)]
pub struct EqualWidthHistogram<T: HistogramValue> {
    bins: BinSet<T>,
    domain: T::Domain,
}

impl<T: HistogramValue> EqualWidthHistogram<T> {
    /// Build from a segment iterator (NULLs skipped).
    pub fn from_values<I>(
        segment: I,
        bin_count: usize,
        domain: T::Domain,
    ) -> Result<Self, StatsError>
    where
        I: IntoIterator<Item = Option<T>>,
    {
        let distribution = gather_value_distribution(segment, &domain)?;
        Self::from_distribution(distribution, bin_count, domain)
    }

    /// Build from a sorted value distribution.
    ///
    /// Discrete domains use bins of `⌈W/β⌉` domain units with a narrower
    /// last bin, so the materialized bin count can fall below the request
    /// when the rounded width covers the span early.
    pub fn from_distribution(
        distribution: Vec<(T, u64)>,
        bin_count: usize,
        domain: T::Domain,
    ) -> Result<Self, StatsError> {
        if bin_count == 0 || distribution.is_empty() {
            return Err(StatsError::TooFewValues {
                requested: bin_count,
                distinct: distribution.len(),
            });
        }

        let minimum = &distribution[0].0;
        let maximum = &distribution[distribution.len() - 1].0;
        let (minima, mut maxima) =
            T::partition_equal_width(minimum, maximum, bin_count, &domain);

        let mut heights = vec![0u64; minima.len()];
        let mut distinct_counts = vec![0u64; minima.len()];
        for (value, count) in &distribution {
            // Last bin whose minimum does not exceed the value. String
            // values longer than the encoding prefix can overshoot the
            // bin's round-tripped upper edge; widen it to keep the value
            // covered (the next bin starts strictly above the value).
            let bin = minima
                .partition_point(|min| min.cmp_values(value) != Ordering::Greater)
                - 1;
            if value.cmp_values(&maxima[bin]) == Ordering::Greater {
                maxima[bin] = value.clone();
            }
            heights[bin] += count;
            distinct_counts[bin] += 1;
        }

        Ok(EqualWidthHistogram {
            bins: BinSet::new(minima, maxima, heights, distinct_counts),
            domain,
        })
    }
}

impl<T: HistogramValue> Histogram<T> for EqualWidthHistogram<T> {
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
        "EqualWidth"
    }

    fn boxed_clone(&self) -> Box<dyn Histogram<T> + Send + Sync> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bins_are_legal() {
        // Values 1..=4 and 99..=100 over four bins of width 25.
        let segment =
            vec![Some(1i32), Some(2), Some(3), Some(4), Some(99), Some(100), Some(100)];
        let histogram = EqualWidthHistogram::from_values(segment, 4, ()).unwrap();

        assert_eq!(histogram.bin_count(), 4);
        assert_eq!(histogram.bin_height(0), 4);
        assert_eq!(histogram.bin_height(1), 0);
        assert_eq!(histogram.bin_distinct_count(1), 0);
        assert_eq!(histogram.bin_height(2), 0);
        assert_eq!(histogram.bin_height(3), 3);
        assert_eq!(histogram.total_count(), 7);
        assert_eq!(histogram.total_distinct_count(), 6);
    }

    #[test]
    fn test_covers_the_full_span() {
        let segment: Vec<Option<i64>> = (1..=100).map(Some).collect();
        let histogram = EqualWidthHistogram::from_values(segment, 10, ()).unwrap();

        assert_eq!(histogram.bin_count(), 10);
        assert_eq!(*histogram.minimum(), 1);
        assert_eq!(*histogram.maximum(), 100);
        for bin in 0..10 {
            assert_eq!(histogram.bin_height(bin), 10);
            assert_eq!(histogram.bin_distinct_count(bin), 10);
        }
    }

    #[test]
    fn test_bin_count_capped_at_domain_span() {
        let segment = vec![Some(10i32), Some(11), Some(12)];
        let histogram = EqualWidthHistogram::from_values(segment, 100, ()).unwrap();
        assert_eq!(histogram.bin_count(), 3);
    }

    #[test]
    fn test_string_bins_cover_long_values() {
        use super::super::domain::StringDomain;

        let domain = StringDomain::new("abcdefghijklmnopqrstuvwxyz", 4).unwrap();
        let segment = vec![
            Some("aaaa".to_string()),
            Some("aaaazzz".to_string()),
            Some("mmmm".to_string()),
            Some("zzzz".to_string()),
        ];
        let histogram = EqualWidthHistogram::from_values(segment, 3, domain).unwrap();

        assert_eq!(histogram.total_count(), 4);
        // Every value is inside some bin.
        for value in ["aaaa", "aaaazzz", "mmmm", "zzzz"] {
            assert!(
                histogram.bin_for_value(&value.to_string()).is_some(),
                "{} not covered",
                value
            );
        }
    }

    #[test]
    fn test_rejects_empty_distribution() {
        let err =
            EqualWidthHistogram::from_distribution(Vec::<(i32, u64)>::new(), 4, ()).unwrap_err();
        assert_eq!(err, StatsError::TooFewValues { requested: 4, distinct: 0 });
    }
}
