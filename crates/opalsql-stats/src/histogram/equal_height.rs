//! Equal-height layout
//!
//! Greedily fills bins with distinct values until each holds at least the
//! target number of rows. The per-bin height is stored as one shared scalar:
//! all bins except the last reach the target by construction, and the last
//! one may fall short or overshoot. The estimation engine compensates by
//! capping range sums at the true total. Consecutive bins touch: each bin
//! starts at the successor of its predecessor's maximum.

use crate::error::StatsError;

use super::bins::{bin_for_value_in, next_bin_for_value_in, BinId};
use super::domain::HistogramValue;
use super::estimator::Histogram;
use super::value_distribution::gather_value_distribution;

#[derive(Debug, Clone, PartialEq)]
pub struct EqualHeightHistogram<T: HistogramValue> {
    minima: Vec<T>,
    maxima: Vec<T>,
    distinct_counts: Vec<u64>,
    height_per_bin: u64,
    total_count: u64,
    total_distinct_count: u64,
    domain: T::Domain,
}

impl<T: HistogramValue> EqualHeightHistogram<T> {
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
    /// Produces at most `bin_count` bins; fewer when the values run out
    /// before all bins fill up.
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

        let total_count: u64 = distribution.iter().map(|(_, count)| count).sum();
        let total_distinct_count = distribution.len() as u64;
        let height_per_bin = total_count.div_ceil(bin_count as u64);

        let mut minima = vec![distribution[0].0.clone()];
        let mut maxima = Vec::new();
        let mut distinct_counts = Vec::new();

        let mut current_height = 0u64;
        let mut current_distinct = 0u64;
        for (index, (value, count)) in distribution.iter().enumerate() {
            current_height += count;
            current_distinct += 1;
            let is_last = index == distribution.len() - 1;
            if is_last {
                maxima.push(value.clone());
                distinct_counts.push(current_distinct);
            } else if current_height >= height_per_bin {
                maxima.push(value.clone());
                distinct_counts.push(current_distinct);
                minima.push(value.successor(&domain));
                current_height = 0;
                current_distinct = 0;
            }
        }

        Ok(EqualHeightHistogram {
            minima,
            maxima,
            distinct_counts,
            height_per_bin,
            total_count,
            total_distinct_count,
            domain,
        })
    }

    /// The shared per-bin row count target.
    pub fn height_per_bin(&self) -> u64 {
        self.height_per_bin
    }
}

impl<T: HistogramValue> Histogram<T> for EqualHeightHistogram<T> {
    fn domain(&self) -> &T::Domain {
        &self.domain
    }

    fn bin_count(&self) -> usize {
        self.minima.len()
    }

    fn bin_minimum(&self, id: BinId) -> &T {
        &self.minima[id]
    }

    fn bin_maximum(&self, id: BinId) -> &T {
        &self.maxima[id]
    }

    fn bin_height(&self, _id: BinId) -> u64 {
        self.height_per_bin
    }

    fn bin_distinct_count(&self, id: BinId) -> u64 {
        self.distinct_counts[id]
    }

    fn bin_for_value(&self, value: &T) -> Option<BinId> {
        bin_for_value_in(&self.minima, &self.maxima, value)
    }

    fn next_bin_for_value(&self, value: &T) -> Option<BinId> {
        next_bin_for_value_in(&self.minima, value)
    }

    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn total_distinct_count(&self) -> u64 {
        self.total_distinct_count
    }

    fn layout_name(&self) -> &'static str {
        "EqualHeight"
    }

    fn boxed_clone(&self) -> Box<dyn Histogram<T> + Send + Sync> {
        Box::new(self.clone())
    }
}
