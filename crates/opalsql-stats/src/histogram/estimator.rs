//! The predicate estimation engine
//!
//! All histogram kinds answer predicate questions through the same engine:
//! the [`Histogram`] trait requires only the bin accessors and provides
//! pruning, cardinality estimation, selectivity and slicing on top of them.
//!
//! Pruning is sound: `does_not_contain` returns `true` only when the
//! predicate provably matches no row of the summarized segment. Estimation
//! interpolates linearly inside bins and reports whether the answer is exact
//! through [`Estimate::is_certain`].

use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::error::StatsError;
use crate::predicate::Predicate;

use super::bins::BinId;
use super::domain::HistogramValue;
use super::generic::GenericHistogram;

/// A cardinality or selectivity estimate paired with an exactness flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Estimated row count (or match fraction, for selectivity).
    pub value: f64,
    /// True when the answer is exact rather than model-based.
    pub is_certain: bool,
}

impl Estimate {
    pub fn certain(value: f64) -> Self {
        Estimate { value, is_certain: true }
    }

    pub fn approximate(value: f64) -> Self {
        Estimate { value, is_certain: false }
    }
}

/// Share of bin `bin` lying strictly below `value`.
fn share_of_bin_below<T, H>(histogram: &H, bin: BinId, value: &T) -> f64
where
    T: HistogramValue,
    H: Histogram<T> + ?Sized,
{
    T::share_below(
        histogram.bin_minimum(bin),
        histogram.bin_maximum(bin),
        value,
        histogram.domain(),
    )
}

fn expect_second<'a, T>(value2: Option<&'a T>) -> &'a T {
    match value2 {
        Some(value2) => value2,
        None => panic!("BETWEEN needs a second value"),
    }
}

/// The capability set shared by all histogram kinds, plus the estimation
/// engine built on it.
///
/// Implementors supply the accessors; every query operation is a provided
/// method. Bins are ordered, non-overlapping and immutable.
pub trait Histogram<T: HistogramValue>: std::fmt::Debug {
    /// Domain context for value arithmetic (alphabet settings for strings).
    fn domain(&self) -> &T::Domain;

    fn bin_count(&self) -> usize;
    fn bin_minimum(&self, id: BinId) -> &T;
    fn bin_maximum(&self, id: BinId) -> &T;
    fn bin_height(&self, id: BinId) -> u64;
    fn bin_distinct_count(&self, id: BinId) -> u64;

    /// Bin containing `value`, or `None` for a gap or out-of-range value.
    fn bin_for_value(&self, value: &T) -> Option<BinId>;

    /// First bin whose minimum is strictly greater than `value`.
    fn next_bin_for_value(&self, value: &T) -> Option<BinId>;

    fn total_count(&self) -> u64;
    fn total_distinct_count(&self) -> u64;

    /// Layout label used by [`description`](Self::description).
    fn layout_name(&self) -> &'static str;

    /// A deep copy behind a fresh box, for shared facades.
    fn boxed_clone(&self) -> Box<dyn Histogram<T> + Send + Sync>;

    fn minimum(&self) -> &T {
        self.bin_minimum(0)
    }

    fn maximum(&self) -> &T {
        self.bin_maximum(self.bin_count() - 1)
    }

    /// Width of a bin in domain units.
    fn bin_width(&self, id: BinId) -> f64 {
        T::interval_width(self.bin_minimum(id), self.bin_maximum(id), self.domain())
    }

    /// Human-readable dump of the histogram.
    fn description(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.layout_name());
        let _ = writeln!(out, "  distinct    {}", self.total_distinct_count());
        let _ = writeln!(out, "  min         {}", self.minimum());
        let _ = writeln!(out, "  max         {}", self.maximum());
        let _ = writeln!(out, "  bins        {}", self.bin_count());
        let _ = writeln!(out, "  edges / counts");
        for bin in 0..self.bin_count() {
            let _ = writeln!(
                out,
                "              [{}, {}]: {}",
                self.bin_minimum(bin),
                self.bin_maximum(bin),
                self.bin_height(bin)
            );
        }
        out
    }

    /// Sound pruning: `true` only if no row can match the predicate.
    ///
    /// (NOT) LIKE is not handled by the generic engine; string histograms
    /// route patterns through the pattern analyzer before reaching here.
    fn does_not_contain(
        &self,
        predicate: Predicate,
        value: &T,
        value2: Option<&T>,
    ) -> Result<bool, StatsError> {
        match predicate {
            Predicate::Equals => Ok(match self.bin_for_value(value) {
                Some(bin) => self.bin_height(bin) == 0,
                None => true,
            }),
            Predicate::NotEquals => Ok(self.minimum().cmp_values(value) == Ordering::Equal
                && self.maximum().cmp_values(value) == Ordering::Equal),
            Predicate::LessThan => {
                Ok(value.cmp_values(self.minimum()) != Ordering::Greater)
            }
            Predicate::LessThanEquals => {
                Ok(value.cmp_values(self.minimum()) == Ordering::Less)
            }
            Predicate::GreaterThanEquals => {
                Ok(value.cmp_values(self.maximum()) == Ordering::Greater)
            }
            Predicate::GreaterThan => {
                Ok(value.cmp_values(self.maximum()) != Ordering::Less)
            }
            Predicate::Between => {
                let value2 = expect_second(value2);
                if self.does_not_contain(Predicate::GreaterThanEquals, value, None)? {
                    return Ok(true);
                }
                if value2.cmp_values(value) == Ordering::Less
                    || self.does_not_contain(Predicate::LessThanEquals, value2, None)?
                {
                    return Ok(true);
                }

                let value_bin = self.bin_for_value(value);
                let value2_bin = self.bin_for_value(value2);

                // Both endpoints in the same gap between bins. At least two
                // bins are needed to rule out value < min and value2 > max.
                if value_bin.is_none()
                    && value2_bin.is_none()
                    && self.bin_count() > 1
                    && self.next_bin_for_value(value) == self.next_bin_for_value(value2)
                {
                    return Ok(true);
                }

                // Both endpoints in empty bins, with nothing but empty bins
                // in between (possible under the equal-width layout).
                if let (Some(first), Some(second)) = (value_bin, value2_bin) {
                    if self.bin_height(first) == 0
                        && self.bin_height(second) == 0
                        && (first + 1..second).all(|bin| self.bin_height(bin) == 0)
                    {
                        return Ok(true);
                    }
                }

                Ok(false)
            }
            Predicate::Like | Predicate::NotLike => Err(StatsError::UnsupportedPredicate),
        }
    }

    /// Estimate the number of rows matching the predicate.
    fn estimate_cardinality(
        &self,
        predicate: Predicate,
        value: &T,
        value2: Option<&T>,
    ) -> Result<Estimate, StatsError> {
        if self.does_not_contain(predicate, value, value2)? {
            return Ok(Estimate::certain(0.0));
        }

        let total = self.total_count() as f64;
        match predicate {
            Predicate::Equals => {
                let Some(bin) = self.bin_for_value(value) else {
                    return Ok(Estimate::certain(0.0));
                };
                let distinct_count = self.bin_distinct_count(bin);
                Ok(Estimate {
                    value: self.bin_height(bin) as f64 / distinct_count as f64,
                    is_certain: distinct_count == 1,
                })
            }
            Predicate::NotEquals => {
                let equals = self.estimate_cardinality(Predicate::Equals, value, None)?;
                Ok(Estimate { value: total - equals.value, is_certain: equals.is_certain })
            }
            Predicate::LessThan => {
                if value.cmp_values(self.maximum()) == Ordering::Greater {
                    return Ok(Estimate::certain(total));
                }

                let mut cardinality = 0.0;
                let mut is_certain = false;
                let index = match self.bin_for_value(value) {
                    Some(bin) => {
                        cardinality +=
                            share_of_bin_below(self, bin, value) * self.bin_height(bin) as f64;
                        bin
                    }
                    None => {
                        // Inside the histogram's range but in a gap: the sum
                        // of all bins below is exact.
                        is_certain = true;
                        self.next_bin_for_value(value).unwrap_or_else(|| self.bin_count())
                    }
                };
                for bin in 0..index {
                    cardinality += self.bin_height(bin) as f64;
                }

                // The equal-height layout shares one height scalar across all
                // bins, so the last bin can make the sum overshoot the real
                // total; cap it.
                Ok(Estimate { value: cardinality.min(total), is_certain })
            }
            Predicate::LessThanEquals => self.estimate_cardinality(
                Predicate::LessThan,
                &value.successor(self.domain()),
                None,
            ),
            Predicate::GreaterThanEquals => {
                let less_than =
                    self.estimate_cardinality(Predicate::LessThan, value, None)?;
                Ok(Estimate {
                    value: total - less_than.value,
                    is_certain: less_than.is_certain,
                })
            }
            Predicate::GreaterThan => {
                let up_to = self.estimate_cardinality(Predicate::LessThanEquals, value, None)?;
                Ok(Estimate { value: total - up_to.value, is_certain: up_to.is_certain })
            }
            Predicate::Between => {
                let value2 = expect_second(value2);
                if value2.cmp_values(value) == Ordering::Less {
                    return Ok(Estimate::certain(0.0));
                }
                let below_upper =
                    self.estimate_cardinality(Predicate::LessThanEquals, value2, None)?;
                let below_lower =
                    self.estimate_cardinality(Predicate::LessThan, value, None)?;
                Ok(Estimate {
                    value: below_upper.value - below_lower.value,
                    is_certain: below_upper.is_certain && below_lower.is_certain,
                })
            }
            Predicate::Like | Predicate::NotLike => Err(StatsError::UnsupportedPredicate),
        }
    }

    /// Estimated fraction of rows matching the predicate.
    fn estimate_selectivity(
        &self,
        predicate: Predicate,
        value: &T,
        value2: Option<&T>,
    ) -> Result<Estimate, StatsError> {
        let estimate = self.estimate_cardinality(predicate, value, value2)?;
        Ok(Estimate {
            value: estimate.value / self.total_count() as f64,
            is_certain: estimate.is_certain,
        })
    }

    /// The histogram of the rows that survive the predicate.
    ///
    /// The result has explicit bins, except when the predicate keeps every
    /// row: then it is a clone of the source. Fails with
    /// [`StatsError::EmptySlice`] when the predicate prunes and with
    /// [`StatsError::UnsupportedSlice`] for (NOT) LIKE.
    fn slice_with_predicate(
        &self,
        predicate: Predicate,
        value: &T,
        value2: Option<&T>,
    ) -> Result<Box<dyn Histogram<T> + Send + Sync>, StatsError> {
        if matches!(predicate, Predicate::Like | Predicate::NotLike) {
            return Err(StatsError::UnsupportedSlice);
        }
        if self.does_not_contain(predicate, value, value2)? {
            return Err(StatsError::EmptySlice);
        }

        match predicate {
            Predicate::Equals => {
                let height = self
                    .estimate_cardinality(Predicate::Equals, value, None)?
                    .value
                    .ceil() as u64;
                Ok(Box::new(GenericHistogram::new(
                    vec![value.clone()],
                    vec![value.clone()],
                    vec![height],
                    vec![1],
                    self.domain().clone(),
                )))
            }
            Predicate::NotEquals => {
                let value_bin = self.bin_for_value(value);
                let mut minima = Vec::with_capacity(self.bin_count());
                let mut maxima = Vec::with_capacity(self.bin_count());
                let mut heights = Vec::with_capacity(self.bin_count());
                let mut distinct_counts = Vec::with_capacity(self.bin_count());

                for bin in 0..self.bin_count() {
                    let mut height = self.bin_height(bin);
                    let mut distinct_count = self.bin_distinct_count(bin);
                    if value_bin == Some(bin) {
                        // The bin's only value is the excluded one: drop it.
                        if distinct_count == 1 {
                            continue;
                        }
                        let value_count = self
                            .estimate_cardinality(Predicate::Equals, value, None)?
                            .value
                            .ceil() as u64;
                        height = height.saturating_sub(value_count);
                        distinct_count -= 1;
                    }
                    minima.push(self.bin_minimum(bin).clone());
                    maxima.push(self.bin_maximum(bin).clone());
                    heights.push(height);
                    distinct_counts.push(distinct_count);
                }
                if minima.is_empty() {
                    return Err(StatsError::EmptySlice);
                }
                Ok(Box::new(GenericHistogram::new(
                    minima,
                    maxima,
                    heights,
                    distinct_counts,
                    self.domain().clone(),
                )))
            }
            Predicate::LessThan | Predicate::LessThanEquals => {
                let sliced_bin_count = match self.bin_for_value(value) {
                    None => match self.next_bin_for_value(value) {
                        // Every value is below the bound: the slice is a copy.
                        None => return Ok(self.boxed_clone()),
                        Some(next) => next,
                    },
                    // The bound sits on the bin's lower edge: a strict
                    // comparison excludes the whole bin.
                    Some(bin)
                        if predicate == Predicate::LessThan
                            && value.cmp_values(self.bin_minimum(bin)) == Ordering::Equal =>
                    {
                        bin
                    }
                    Some(bin) => bin + 1,
                };
                if sliced_bin_count == 0 {
                    return Err(StatsError::EmptySlice);
                }

                let minima: Vec<T> =
                    (0..sliced_bin_count).map(|bin| self.bin_minimum(bin).clone()).collect();
                let mut maxima: Vec<T> =
                    (0..sliced_bin_count).map(|bin| self.bin_maximum(bin).clone()).collect();
                let mut heights: Vec<u64> =
                    (0..sliced_bin_count).map(|bin| self.bin_height(bin)).collect();
                let mut distinct_counts: Vec<u64> =
                    (0..sliced_bin_count).map(|bin| self.bin_distinct_count(bin)).collect();

                let last = sliced_bin_count - 1;
                if value.cmp_values(self.bin_maximum(last)) == Ordering::Less {
                    // The bound falls inside the last kept bin: clip it and
                    // scale its counts by the covered share.
                    let bound = match predicate {
                        Predicate::LessThan => value.clone(),
                        _ => value.successor(self.domain()),
                    };
                    let share = share_of_bin_below(self, last, &bound);
                    maxima[last] = value.clone();
                    heights[last] = (self.bin_height(last) as f64 * share).ceil() as u64;
                    distinct_counts[last] =
                        (self.bin_distinct_count(last) as f64 * share).ceil() as u64;
                }
                Ok(Box::new(GenericHistogram::new(
                    minima,
                    maxima,
                    heights,
                    distinct_counts,
                    self.domain().clone(),
                )))
            }
            Predicate::GreaterThan | Predicate::GreaterThanEquals => {
                let sliced_bin_count = match self.bin_for_value(value) {
                    None => match self.next_bin_for_value(value) {
                        // Every value is above the bound: the slice is a copy.
                        Some(0) => return Ok(self.boxed_clone()),
                        Some(next) => self.bin_count() - next,
                        None => 0,
                    },
                    Some(bin)
                        if predicate == Predicate::GreaterThan
                            && value.cmp_values(self.bin_maximum(bin)) == Ordering::Equal =>
                    {
                        self.bin_count() - bin - 1
                    }
                    Some(bin) => self.bin_count() - bin,
                };
                if sliced_bin_count == 0 {
                    return Err(StatsError::EmptySlice);
                }

                let first = self.bin_count() - sliced_bin_count;
                let mut minima: Vec<T> =
                    (first..self.bin_count()).map(|bin| self.bin_minimum(bin).clone()).collect();
                let maxima: Vec<T> =
                    (first..self.bin_count()).map(|bin| self.bin_maximum(bin).clone()).collect();
                let mut heights: Vec<u64> =
                    (first..self.bin_count()).map(|bin| self.bin_height(bin)).collect();
                let mut distinct_counts: Vec<u64> = (first..self.bin_count())
                    .map(|bin| self.bin_distinct_count(bin))
                    .collect();

                if value.cmp_values(self.bin_minimum(first)) == Ordering::Greater {
                    // The bound falls inside the first kept bin: clip it and
                    // scale its counts by the remaining share.
                    let share = 1.0 - share_of_bin_below(self, first, value);
                    minima[0] = match predicate {
                        Predicate::GreaterThan => value.successor(self.domain()),
                        _ => value.clone(),
                    };
                    heights[0] = (self.bin_height(first) as f64 * share).ceil() as u64;
                    distinct_counts[0] =
                        (self.bin_distinct_count(first) as f64 * share).ceil() as u64;
                }
                Ok(Box::new(GenericHistogram::new(
                    minima,
                    maxima,
                    heights,
                    distinct_counts,
                    self.domain().clone(),
                )))
            }
            Predicate::Between => {
                let value2 = expect_second(value2);
                self.slice_with_predicate(Predicate::GreaterThanEquals, value, None)?
                    .slice_with_predicate(Predicate::LessThanEquals, value2, None)
            }
            Predicate::Like | Predicate::NotLike => Err(StatsError::UnsupportedSlice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gapped() -> GenericHistogram<i32> {
        // Two bins with a gap (11..=19 holds nothing).
        GenericHistogram::new(vec![1, 20], vec![10, 30], vec![8, 12], vec![4, 6], ())
    }

    fn with_empty_bins() -> GenericHistogram<i32> {
        // Middle bins carry no rows, as the equal-width layout produces.
        GenericHistogram::new(
            vec![1, 11, 21, 31],
            vec![10, 20, 30, 40],
            vec![8, 0, 0, 12],
            vec![4, 0, 0, 6],
            (),
        )
    }

    #[test]
    fn test_between_prunes_inside_a_single_gap() {
        let histogram = gapped();
        assert!(histogram.does_not_contain(Predicate::Between, &12, Some(&18)).unwrap());
        // Endpoints in different gaps or touching a bin are not prunable.
        assert!(!histogram.does_not_contain(Predicate::Between, &12, Some(&20)).unwrap());
        assert!(!histogram.does_not_contain(Predicate::Between, &5, Some(&18)).unwrap());
    }

    #[test]
    fn test_between_prunes_across_empty_bins() {
        let histogram = with_empty_bins();
        assert!(histogram.does_not_contain(Predicate::Between, &12, Some(&28)).unwrap());
        assert!(histogram.does_not_contain(Predicate::Between, &12, Some(&15)).unwrap());
        // One endpoint in a populated bin.
        assert!(!histogram.does_not_contain(Predicate::Between, &5, Some(&28)).unwrap());
        assert!(!histogram.does_not_contain(Predicate::Between, &12, Some(&35)).unwrap());
    }

    #[test]
    fn test_equals_prunes_empty_bins() {
        let histogram = with_empty_bins();
        assert!(histogram.does_not_contain(Predicate::Equals, &15, None).unwrap());
        assert!(!histogram.does_not_contain(Predicate::Equals, &5, None).unwrap());
    }

    #[test]
    fn test_not_equals_pruning_needs_a_single_value_histogram() {
        let single = GenericHistogram::new(vec![7], vec![7], vec![3], vec![1], ());
        assert!(single.does_not_contain(Predicate::NotEquals, &7, None).unwrap());
        assert!(!single.does_not_contain(Predicate::NotEquals, &8, None).unwrap());
        assert!(!gapped().does_not_contain(Predicate::NotEquals, &7, None).unwrap());
    }

    #[test]
    fn test_less_than_sums_bins_and_interpolates() {
        let histogram = gapped();
        // 5 sits halfway through [1, 10]: share 4/10 of 8 rows.
        let estimate = histogram.estimate_cardinality(Predicate::LessThan, &5, None).unwrap();
        assert!((estimate.value - 3.2).abs() < 1e-9);
        assert!(!estimate.is_certain);

        // 15 lies in the gap: the first bin's rows, exactly.
        let estimate = histogram.estimate_cardinality(Predicate::LessThan, &15, None).unwrap();
        assert_eq!(estimate.value, 8.0);
        assert!(estimate.is_certain);
    }

    #[test]
    fn test_like_on_the_generic_engine_is_rejected() {
        let histogram = gapped();
        assert_eq!(
            histogram.does_not_contain(Predicate::Like, &1, None).unwrap_err(),
            StatsError::UnsupportedPredicate
        );
        assert_eq!(
            histogram.slice_with_predicate(Predicate::NotLike, &1, None).unwrap_err(),
            StatsError::UnsupportedSlice
        );
    }

    #[test]
    #[should_panic(expected = "BETWEEN needs a second value")]
    fn test_between_without_second_value_panics() {
        let _ = gapped().does_not_contain(Predicate::Between, &1, None);
    }
}
