//! LIKE pattern analysis and string-specific estimation
//!
//! LIKE patterns know two wildcards: `%` matches any character sequence and
//! `_` matches exactly one character. The histogram can only reason about
//! the pattern's leading fixed prefix: a pattern `foo%...` matches exactly
//! the strings in `[foo, fop)`, where `fop` is the prefix's next value in
//! the string domain. Characters fixed after the first `%` are folded in
//! under a uniform-distribution assumption, one factor of `1/K` each.

use crate::error::StatsError;
use crate::predicate::Predicate;

use super::estimator::{Estimate, Histogram};

/// Matches any sequence of characters in a LIKE pattern.
pub const ANY_CHARS_WILDCARD: char = '%';
/// Matches exactly one character in a LIKE pattern.
pub const SINGLE_CHAR_WILDCARD: char = '_';

/// Whether the pattern contains any wildcard at all.
pub fn contains_wildcard(pattern: &str) -> bool {
    pattern.contains(ANY_CHARS_WILDCARD) || pattern.contains(SINGLE_CHAR_WILDCARD)
}

fn any_chars_count(pattern: &str) -> usize {
    pattern.matches(ANY_CHARS_WILDCARD).count()
}

fn single_char_count(pattern: &str) -> usize {
    pattern.matches(SINGLE_CHAR_WILDCARD).count()
}

/// The pattern's leading run of fixed characters (up to the first wildcard
/// of either kind). Every match starts with this prefix.
fn fixed_prefix(pattern: &str) -> &str {
    let end = pattern
        .find([ANY_CHARS_WILDCARD, SINGLE_CHAR_WILDCARD])
        .unwrap_or(pattern.len());
    &pattern[..end]
}

/// Sound pruning for `LIKE pattern`.
pub(crate) fn does_not_contain_like<H>(
    histogram: &H,
    pattern: &str,
) -> Result<bool, StatsError>
where
    H: Histogram<String> + ?Sized,
{
    if !contains_wildcard(pattern) {
        return histogram.does_not_contain(Predicate::Equals, &pattern.to_string(), None);
    }
    // A pattern starting with AnyChars can match anywhere in the domain.
    if pattern.starts_with(ANY_CHARS_WILDCARD) {
        return Ok(false);
    }

    // Matches are confined to [prefix, next_value(prefix)): prune when that
    // interval provably holds no segment value.
    let prefix = fixed_prefix(pattern).to_string();
    if prefix.is_empty() {
        return Ok(false);
    }
    if histogram.does_not_contain(Predicate::GreaterThanEquals, &prefix, None)? {
        return Ok(true);
    }

    let prefix_next = histogram.domain().next_value_of_length(&prefix, prefix.len());
    // The prefix is the top of its length domain: no exclusive upper bound
    // exists, and the check above already failed to prune.
    if prefix_next == prefix {
        return Ok(false);
    }
    if histogram.does_not_contain(Predicate::LessThan, &prefix_next, None)? {
        return Ok(true);
    }

    let prefix_bin = histogram.bin_for_value(&prefix);
    let prefix_next_bin = histogram.bin_for_value(&prefix_next);

    if prefix_bin.is_none() {
        let next_bin_of_prefix = histogram.next_bin_for_value(&prefix);

        // Both interval ends in the same gap between bins.
        if prefix_next_bin.is_none()
            && histogram.bin_count() > 1
            && next_bin_of_prefix == histogram.next_bin_for_value(&prefix_next)
        {
            return Ok(true);
        }

        // The interval's exclusive end sits exactly on the lower edge of the
        // bin following the gap: the covered range ends before the bin.
        if let Some(next_value_bin) = prefix_next_bin {
            if next_bin_of_prefix == Some(next_value_bin)
                && *histogram.bin_minimum(next_value_bin) == prefix_next
            {
                return Ok(true);
            }
        }
    }

    // Both ends inside empty bins with only empty bins between them (the
    // end bin may alternatively start exactly at the exclusive bound).
    if let (Some(first), Some(second)) = (prefix_bin, prefix_next_bin) {
        if histogram.bin_height(first) == 0
            && (histogram.bin_height(second) == 0
                || *histogram.bin_minimum(second) == prefix_next)
            && (first + 1..second).all(|bin| histogram.bin_height(bin) == 0)
        {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Sound pruning for `NOT LIKE pattern`.
pub(crate) fn does_not_contain_not_like<H>(
    histogram: &H,
    pattern: &str,
) -> Result<bool, StatsError>
where
    H: Histogram<String> + ?Sized,
{
    if !contains_wildcard(pattern) {
        return histogram.does_not_contain(Predicate::NotEquals, &pattern.to_string(), None);
    }
    // Only the match-everything pattern is prunable among those starting
    // with AnyChars.
    if pattern.starts_with(ANY_CHARS_WILDCARD) {
        return Ok(pattern == "%");
    }

    // NOT LIKE 'prefix%' can be pruned when every value in the histogram
    // starts with the prefix: then every value matches the LIKE pattern and
    // nothing is left. This requires the pattern to accept arbitrary tails,
    // so anything after the first AnyChars must be more AnyChars.
    if let Some(index) = pattern.find(ANY_CHARS_WILDCARD) {
        let prefix = &pattern[..index];
        if !prefix.contains(SINGLE_CHAR_WILDCARD)
            && pattern[index..].chars().all(|c| c == ANY_CHARS_WILDCARD)
        {
            return Ok(histogram.minimum().starts_with(prefix)
                && histogram.maximum().starts_with(prefix));
        }
    }

    Ok(false)
}

/// Cardinality estimation for `LIKE pattern`.
pub(crate) fn estimate_like<H>(histogram: &H, pattern: &str) -> Result<Estimate, StatsError>
where
    H: Histogram<String> + ?Sized,
{
    if does_not_contain_like(histogram, pattern)? {
        return Ok(Estimate::certain(0.0));
    }
    if !contains_wildcard(pattern) {
        return histogram.estimate_cardinality(Predicate::Equals, &pattern.to_string(), None);
    }

    let total = histogram.total_count() as f64;

    // SingleChar wildcards are not modeled.
    if single_char_count(pattern) > 0 {
        return Ok(Estimate::approximate(total));
    }

    if pattern == "%" {
        return Ok(Estimate::certain(total));
    }

    let radix = histogram.domain().radix() as f64;
    let any_chars = any_chars_count(pattern);

    if !pattern.starts_with(ANY_CHARS_WILDCARD) {
        // Prefix search: the strings matching 'prefix%...' lie in
        // [prefix, next_value(prefix)). Characters fixed after the prefix
        // are assumed uniformly distributed, one 1/K factor each, with the
        // exponent capped so K^e stays representable.
        let prefix = fixed_prefix(pattern);
        let mut fixed_after_prefix = pattern.len() - prefix.len() - any_chars;
        let max_exponent = ((u64::MAX as f64).ln() / radix.ln()) as usize;
        fixed_after_prefix = fixed_after_prefix.min(max_exponent);

        let prefix_next =
            histogram.domain().next_value_of_length(prefix, prefix.len());
        let below_next = if prefix_next == prefix {
            // No exclusive upper bound exists in the prefix domain; every
            // value is below it.
            total
        } else {
            histogram
                .estimate_cardinality(Predicate::LessThan, &prefix_next, None)?
                .value
        };
        let below_prefix = histogram
            .estimate_cardinality(Predicate::LessThan, &prefix.to_string(), None)?
            .value;

        return Ok(Estimate::approximate(
            (below_next - below_prefix) / radix.powi(fixed_after_prefix as i32),
        ));
    }

    // Suffix or containment search: the prefix encoding cannot narrow the
    // range, so every fixed character contributes one uniform 1/K factor.
    let fixed_characters = pattern.len() - any_chars;
    Ok(Estimate::approximate(total / radix.powi(fixed_characters as i32)))
}

/// Cardinality estimation for `NOT LIKE pattern`.
pub(crate) fn estimate_not_like<H>(
    histogram: &H,
    pattern: &str,
) -> Result<Estimate, StatsError>
where
    H: Histogram<String> + ?Sized,
{
    if does_not_contain_not_like(histogram, pattern)? {
        return Ok(Estimate::certain(0.0));
    }
    if !contains_wildcard(pattern) {
        return histogram.estimate_cardinality(Predicate::NotEquals, &pattern.to_string(), None);
    }

    let total = histogram.total_count() as f64;
    if single_char_count(pattern) > 0 {
        return Ok(Estimate::approximate(total));
    }

    let like = estimate_like(histogram, pattern)?;
    Ok(Estimate { value: total - like.value, is_certain: like.is_certain })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{GenericHistogram, StringDomain};

    fn bins(edges: &[(&str, &str, u64)]) -> GenericHistogram<String> {
        let domain = StringDomain::new("abcdefghijklmnopqrstuvwxyz", 4).unwrap();
        GenericHistogram::new(
            edges.iter().map(|(min, _, _)| min.to_string()).collect(),
            edges.iter().map(|(_, max, _)| max.to_string()).collect(),
            edges.iter().map(|(_, _, height)| *height).collect(),
            edges.iter().map(|(_, _, height)| (*height).min(2)).collect(),
            domain,
        )
    }

    #[test]
    fn test_contains_wildcard() {
        assert!(contains_wildcard("foo%"));
        assert!(contains_wildcard("f_o"));
        assert!(!contains_wildcard("foo"));
        assert!(!contains_wildcard(""));
    }

    #[test]
    fn test_prefix_interval_in_a_gap_is_pruned() {
        // Bins [aaaa, aabb] and [cccc, dddd]: everything starting with 'b'
        // falls into the gap.
        let histogram = bins(&[("aaaa", "aabb", 5), ("cccc", "dddd", 5)]);
        assert!(does_not_contain_like(&histogram, "b%").unwrap());
        assert!(does_not_contain_like(&histogram, "b%foo").unwrap());
        assert!(!does_not_contain_like(&histogram, "a%").unwrap());
        assert!(!does_not_contain_like(&histogram, "c%").unwrap());
    }

    #[test]
    fn test_prefix_interval_ending_on_a_bin_edge_is_pruned() {
        // 'd%' covers [d, e) and the following bin starts exactly at "e".
        let histogram = bins(&[("aaaa", "aabb", 5), ("e", "ffff", 5)]);
        assert!(does_not_contain_like(&histogram, "d%").unwrap());
        assert!(!does_not_contain_like(&histogram, "e%").unwrap());
    }

    #[test]
    fn test_prefix_interval_over_empty_bins_is_pruned() {
        let histogram = bins(&[("aaaa", "bbbb", 5), ("c", "dzzz", 0), ("ffff", "gggg", 3)]);
        // 'c%' covers [c, d), entirely inside the empty bin.
        assert!(does_not_contain_like(&histogram, "c%").unwrap());
        assert!(!does_not_contain_like(&histogram, "a%").unwrap());
        // 'f%' hits the populated bin.
        assert!(!does_not_contain_like(&histogram, "f%").unwrap());
    }

    #[test]
    fn test_like_without_wildcards_reduces_to_equals() {
        let histogram = bins(&[("aaaa", "bbbb", 6)]);
        assert!(does_not_contain_like(&histogram, "cccc").unwrap());
        assert!(!does_not_contain_like(&histogram, "abab").unwrap());

        let equals = histogram
            .estimate_cardinality(crate::predicate::Predicate::Equals, &"abab".to_string(), None)
            .unwrap();
        let like = estimate_like(&histogram, "abab").unwrap();
        assert_eq!(like, equals);
    }

    #[test]
    fn test_not_like_everything_prunes() {
        // Every value starts with "a".
        let histogram = bins(&[("aaaa", "abzz", 6)]);
        assert!(does_not_contain_not_like(&histogram, "%").unwrap());
        assert!(does_not_contain_not_like(&histogram, "a%").unwrap());
        // A fixed tail after the wildcard may leave non-matching values.
        assert!(!does_not_contain_not_like(&histogram, "a%a").unwrap());
        assert!(!does_not_contain_not_like(&histogram, "b%").unwrap());
    }

    #[test]
    fn test_fixed_prefix_stops_at_either_wildcard() {
        assert_eq!(fixed_prefix("foo%bar"), "foo");
        assert_eq!(fixed_prefix("fo_o%"), "fo");
        assert_eq!(fixed_prefix("foo"), "foo");
        assert_eq!(fixed_prefix("%foo"), "");
    }

    #[test]
    fn test_wildcard_counts() {
        assert_eq!(any_chars_count("foo%bar%"), 2);
        assert_eq!(single_char_count("f_o_o"), 2);
        assert_eq!(any_chars_count("foo"), 0);
    }
}
