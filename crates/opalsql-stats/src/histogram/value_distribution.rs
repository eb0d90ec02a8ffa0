//! Value distribution of a segment
//!
//! The first step of histogram construction: scan the segment once and
//! reduce it to a sorted `(value, occurrences)` list, NULLs skipped.

use itertools::Itertools;

use crate::error::StatsError;

use super::domain::HistogramValue;

/// Gather the sorted value distribution of a segment.
///
/// String values are validated against the domain's supported characters;
/// a single offending character fails the whole construction.
pub fn gather_value_distribution<T, I>(
    segment: I,
    domain: &T::Domain,
) -> Result<Vec<(T, u64)>, StatsError>
where
    T: HistogramValue,
    I: IntoIterator<Item = Option<T>>,
{
    let mut values: Vec<T> = Vec::new();
    for value in segment {
        if let Some(value) = value {
            value.validate(domain)?;
            values.push(value);
        }
    }
    values.sort_unstable_by(|a, b| a.cmp_values(b));

    let distribution = values
        .into_iter()
        .dedup_by_with_count(|a, b| a.cmp_values(b) == std::cmp::Ordering::Equal)
        .map(|(count, value)| (value, count as u64))
        .collect();
    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_grouped() {
        let segment = vec![Some(5i32), Some(3), None, Some(5), Some(1), Some(5), None];
        let distribution = gather_value_distribution(segment, &()).unwrap();
        assert_eq!(distribution, vec![(1, 1), (3, 1), (5, 3)]);
    }

    #[test]
    fn test_all_nulls_yield_empty_distribution() {
        let segment: Vec<Option<i64>> = vec![None, None];
        let distribution = gather_value_distribution(segment, &()).unwrap();
        assert!(distribution.is_empty());
    }

    #[test]
    fn test_unsupported_character_fails() {
        use super::super::domain::StringDomain;

        let domain = StringDomain::new("abcdefghijklmnopqrstuvwxy", 4).unwrap();
        let segment = vec![Some("abc".to_string()), Some("xyz".to_string())];
        let err = gather_value_distribution(segment, &domain).unwrap_err();
        assert_eq!(err, StatsError::UnsupportedCharacter('z'));
    }

    #[test]
    fn test_float_values_group_by_equality() {
        let segment = vec![Some(2.5f64), Some(1.0), Some(2.5), None];
        let distribution = gather_value_distribution(segment, &()).unwrap();
        assert_eq!(distribution, vec![(1.0, 1), (2.5, 2)]);
    }
}
