//! Equal-distinct-count layout
//!
//! Partitions the sorted distinct values into bins holding (nearly) the same
//! number of distinct values each. Bins hug the data exactly, so gaps can
//! separate them; values falling into a gap provably do not occur in the
//! segment.

use crate::error::StatsError;

use super::bins::{BinId, BinSet};
use super::domain::HistogramValue;
use super::estimator::Histogram;
use super::value_distribution::gather_value_distribution;

#[derive(Debug, Clone, PartialEq)]
pub struct EqualDistinctCountHistogram<T: HistogramValue> {
    bins: BinSet<T>,
    domain: T::Domain,
}

impl<T: HistogramValue> EqualDistinctCountHistogram<T> {
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
    /// Requires at least as many distinct values as bins: a bin without any
    /// value has no meaningful boundaries in this layout.
    pub fn from_distribution(
        distribution: Vec<(T, u64)>,
        bin_count: usize,
        domain: T::Domain,
    ) -> Result<Self, StatsError> {
        if bin_count == 0 || distribution.len() < bin_count {
            return Err(StatsError::TooFewValues {
                requested: bin_count,
                distinct: distribution.len(),
            });
        }

        let base_size = distribution.len() / bin_count;

        let mut minima = Vec::with_capacity(bin_count);
        let mut maxima = Vec::with_capacity(bin_count);
        let mut heights = Vec::with_capacity(bin_count);
        let mut distinct_counts = Vec::with_capacity(bin_count);

        let mut start = 0;
        for bin in 0..bin_count {
            // The last bin absorbs the remainder.
            let size = if bin == bin_count - 1 {
                distribution.len() - start
            } else {
                base_size
            };
            let group = &distribution[start..start + size];
            minima.push(group[0].0.clone());
            maxima.push(group[size - 1].0.clone());
            heights.push(group.iter().map(|(_, count)| count).sum());
            distinct_counts.push(size as u64);
            start += size;
        }

        Ok(EqualDistinctCountHistogram {
            bins: BinSet::new(minima, maxima, heights, distinct_counts),
            domain,
        })
    }
}

impl<T: HistogramValue> Histogram<T> for EqualDistinctCountHistogram<T> {
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
        "EqualDistinctCount"
    }

    fn boxed_clone(&self) -> Box<dyn Histogram<T> + Send + Sync> {
        Box::new(self.clone())
    }
}
