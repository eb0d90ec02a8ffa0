//! Value-domain arithmetic
//!
//! The estimation engine reasons about bins through a numeric lens: it needs
//! the width of a value interval and the position of a value inside it. For
//! integers and floats the value domain is numeric already. Strings are
//! mapped onto an ordered numeric domain through a base-K prefix encoding
//! over an explicit, contiguous alphabet: only the first `prefix_length`
//! characters of a string participate, so two strings sharing that prefix
//! are indistinguishable to the encoding (by design of the width bound — an
//! exact order-and-distance-preserving encoding of unbounded strings does
//! not fit in an integer).
//!
//! [`HistogramValue`] is the seam between the generic engine and the
//! per-type arithmetic.

use std::cmp::Ordering;
use std::fmt;

use crate::error::StatsError;

/// Length of the longest shared leading substring of `a` and `b`.
pub fn common_prefix_length(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

/// Alphabet and prefix settings for string histograms.
///
/// The alphabet must be a contiguous ascending run of ASCII characters
/// `[c_low ..= c_high]`. `prefix_length` is the number of leading characters
/// that participate in the numeric encoding; `K^L + L` must fit into 64
/// bits, where `K` is the alphabet size and `L` the prefix length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringDomain {
    characters: String,
    prefix_length: u32,
}

impl StringDomain {
    pub fn new(characters: &str, prefix_length: u32) -> Result<Self, StatsError> {
        if characters.is_empty() {
            return Err(StatsError::InvalidAlphabet("empty".to_string()));
        }
        if !characters.is_ascii() {
            return Err(StatsError::InvalidAlphabet("not ASCII".to_string()));
        }
        for window in characters.as_bytes().windows(2) {
            if window[1] != window[0] + 1 {
                return Err(StatsError::InvalidAlphabet(format!(
                    "characters '{}' and '{}' are not consecutive",
                    window[0] as char, window[1] as char
                )));
            }
        }
        if prefix_length == 0 || !prefix_fits(characters.len() as u64, prefix_length) {
            return Err(StatsError::PrefixTooLong {
                alphabet_size: characters.len(),
                prefix_length,
            });
        }
        Ok(StringDomain { characters: characters.to_string(), prefix_length })
    }

    pub fn characters(&self) -> &str {
        &self.characters
    }

    pub fn prefix_length(&self) -> u32 {
        self.prefix_length
    }

    /// Alphabet size `K`.
    pub fn radix(&self) -> u64 {
        self.characters.len() as u64
    }

    pub fn contains(&self, c: char) -> bool {
        c.is_ascii() && self.characters.as_bytes().contains(&(c as u8))
    }

    pub fn validate_str(&self, value: &str) -> Result<(), StatsError> {
        match value.chars().find(|c| !self.contains(*c)) {
            Some(c) => Err(StatsError::UnsupportedCharacter(c)),
            None => Ok(()),
        }
    }

    fn lowest(&self) -> char {
        self.characters.as_bytes()[0] as char
    }

    fn highest(&self) -> char {
        *self.characters.as_bytes().last().unwrap_or(&0) as char
    }

    /// Position of `c` in the alphabet, 0-based.
    fn index_of(&self, c: char) -> u64 {
        debug_assert!(self.contains(c), "character '{}' outside the alphabet", c);
        (c as u64).saturating_sub(self.characters.as_bytes()[0] as u64)
    }

    /// Numeric representation of the first `prefix_length` characters.
    ///
    /// Character `i` contributes `(index + 1) * K^(L - 1 - i)`; absent
    /// positions contribute zero. The mapping is monotone: `a < b` implies
    /// `to_number(a) <= to_number(b)`.
    pub fn to_number(&self, value: &str) -> u64 {
        let length = self.prefix_length as usize;
        let mut result = 0u64;
        for (position, c) in value.chars().take(length).enumerate() {
            let weight = self.radix().pow((length - position - 1) as u32);
            result += (self.index_of(c) + 1) * weight;
        }
        result
    }

    /// Inverse of [`to_number`](Self::to_number), rounding down.
    ///
    /// Returns the largest representable string whose number does not exceed
    /// `value`. The encoding is not positional (digits run `1..=K` over
    /// base-K weights), so each digit is the capped greedy quotient: suffix
    /// contributions may spill one unit into the digit above, which is also
    /// why distinct strings such as `"az"` and `"b"` can share a number.
    pub fn from_number(&self, value: u64) -> String {
        let mut result = String::new();
        let mut remainder = value;
        for position in (0..self.prefix_length).rev() {
            let weight = self.radix().pow(position);
            let digit = (remainder / weight).min(self.radix());
            if digit == 0 {
                break;
            }
            result.push(self.characters.as_bytes()[(digit - 1) as usize] as char);
            remainder -= digit * weight;
        }
        result
    }

    /// Smallest string strictly greater than `value` (no length limit).
    ///
    /// Appending the lowest alphabet character yields the immediate
    /// lexicographic successor.
    pub fn successor(&self, value: &str) -> String {
        let mut next = String::with_capacity(value.len() + 1);
        next.push_str(value);
        next.push(self.lowest());
        next
    }

    /// Smallest string of length at most `length` strictly greater than
    /// `value` (truncated to `length` characters first).
    ///
    /// Returns the truncated value itself iff it is the maximum string of
    /// that domain, i.e. `c_high` repeated `length` times.
    pub fn next_value_of_length(&self, value: &str, length: usize) -> String {
        if value.len() < length {
            return self.successor(value);
        }

        let mut truncated: Vec<u8> = value.as_bytes()[..length].to_vec();
        let highest = self.highest() as u8;
        if truncated.iter().all(|c| *c == highest) {
            return String::from_utf8(truncated).unwrap_or_default();
        }

        // Base-K increment: bump the last non-maximal character and drop
        // everything after it.
        while let Some(last) = truncated.pop() {
            if last != highest {
                truncated.push(last + 1);
                break;
            }
        }
        String::from_utf8(truncated).unwrap_or_default()
    }
}

impl Default for StringDomain {
    /// Lowercase latin alphabet with the longest legal prefix.
    fn default() -> Self {
        let characters = "abcdefghijklmnopqrstuvwxyz";
        let prefix_length = max_prefix_length(characters.len() as u64);
        StringDomain { characters: characters.to_string(), prefix_length }
    }
}

fn prefix_fits(radix: u64, prefix_length: u32) -> bool {
    radix
        .checked_pow(prefix_length)
        .and_then(|power| power.checked_add(prefix_length as u64))
        .is_some()
}

/// Largest prefix length `L` with `K^L + L` representable in 64 bits.
fn max_prefix_length(radix: u64) -> u32 {
    let mut length = 1;
    while prefix_fits(radix, length + 1) {
        length += 1;
    }
    length
}

/// Per-type arithmetic consumed by the generic estimation engine.
///
/// The associated `Domain` carries whatever context the arithmetic needs:
/// nothing for numeric types, the alphabet settings for strings.
pub trait HistogramValue:
    Clone + PartialEq + PartialOrd + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    type Domain: Clone + fmt::Debug + Default + PartialEq + Send + Sync + 'static;

    /// Total order used for sorting and bin lookup. Coincides with the
    /// natural order wherever the latter is defined.
    fn cmp_values(&self, other: &Self) -> Ordering;

    /// Smallest value strictly greater than `self`, saturating at the top of
    /// the domain.
    fn successor(&self, domain: &Self::Domain) -> Self;

    /// Number of domain units covered by the closed interval `[min, max]`.
    fn interval_width(min: &Self, max: &Self, domain: &Self::Domain) -> f64;

    /// Share of the closed interval `[min, max]` lying strictly below
    /// `value`, assuming a uniform distribution inside the interval.
    fn share_below(min: &Self, max: &Self, value: &Self, domain: &Self::Domain) -> f64;

    /// Split `[min, max]` into at most `bin_count` contiguous intervals of
    /// (nearly) equal width, returned as parallel minima/maxima vectors.
    fn partition_equal_width(
        min: &Self,
        max: &Self,
        bin_count: usize,
        domain: &Self::Domain,
    ) -> (Vec<Self>, Vec<Self>);

    /// Check a segment value against the domain.
    fn validate(&self, domain: &Self::Domain) -> Result<(), StatsError>;
}

macro_rules! integer_histogram_value {
    ($t:ty) => {
        impl HistogramValue for $t {
            type Domain = ();

            fn cmp_values(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            fn successor(&self, _domain: &()) -> Self {
                self.checked_add(1).unwrap_or(*self)
            }

            fn interval_width(min: &Self, max: &Self, _domain: &()) -> f64 {
                (*max as i128 - *min as i128 + 1) as f64
            }

            fn share_below(min: &Self, max: &Self, value: &Self, domain: &()) -> f64 {
                (*value as i128 - *min as i128) as f64 / Self::interval_width(min, max, domain)
            }

            fn partition_equal_width(
                min: &Self,
                max: &Self,
                bin_count: usize,
                _domain: &(),
            ) -> (Vec<Self>, Vec<Self>) {
                let span = (*max as i128 - *min as i128 + 1) as u128;
                let width = span.div_ceil(bin_count as u128) as i128;

                // Bins of equal width; the last one takes what remains of
                // the span and may be narrower.
                let mut minima = Vec::with_capacity(bin_count);
                let mut maxima = Vec::with_capacity(bin_count);
                let mut cursor = *min as i128;
                let end = *max as i128;
                while cursor <= end {
                    let upper = (cursor + width - 1).min(end);
                    minima.push(cursor as $t);
                    maxima.push(upper as $t);
                    cursor = upper + 1;
                }
                (minima, maxima)
            }

            fn validate(&self, _domain: &()) -> Result<(), StatsError> {
                Ok(())
            }
        }
    };
}

integer_histogram_value!(i32);
integer_histogram_value!(i64);

macro_rules! float_histogram_value {
    ($t:ty) => {
        impl HistogramValue for $t {
            type Domain = ();

            fn cmp_values(&self, other: &Self) -> Ordering {
                self.total_cmp(other)
            }

            fn successor(&self, _domain: &()) -> Self {
                self.next_up()
            }

            fn interval_width(min: &Self, max: &Self, _domain: &()) -> f64 {
                (*max - *min).next_up() as f64
            }

            fn share_below(min: &Self, max: &Self, value: &Self, domain: &()) -> f64 {
                (*value - *min) as f64 / Self::interval_width(min, max, domain)
            }

            fn partition_equal_width(
                min: &Self,
                max: &Self,
                bin_count: usize,
                _domain: &(),
            ) -> (Vec<Self>, Vec<Self>) {
                let width = (*max - *min) / bin_count as $t;
                if !(width > 0.0) || !width.is_finite() {
                    return (vec![*min], vec![*max]);
                }

                let mut minima = Vec::with_capacity(bin_count);
                let mut maxima = Vec::with_capacity(bin_count);
                let mut lower = *min;
                for bin in 0..bin_count {
                    let is_last = bin == bin_count - 1;
                    let mut upper = *min + width * (bin + 1) as $t;
                    if !is_last && upper <= lower {
                        // Bins narrower than the local float resolution.
                        upper = lower.next_up();
                    }
                    if is_last || upper >= *max {
                        minima.push(lower);
                        maxima.push(*max);
                        break;
                    }
                    minima.push(lower);
                    maxima.push(upper.next_down());
                    lower = upper;
                }
                (minima, maxima)
            }

            fn validate(&self, _domain: &()) -> Result<(), StatsError> {
                Ok(())
            }
        }
    };
}

float_histogram_value!(f32);
float_histogram_value!(f64);

impl HistogramValue for String {
    type Domain = StringDomain;

    fn cmp_values(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn successor(&self, domain: &StringDomain) -> Self {
        domain.successor(self)
    }

    /// Width in the prefix-number domain, after stripping the common prefix
    /// of the interval edges: strings only diverge after their shared
    /// prefix, so the stripped representation is where the resolution is.
    fn interval_width(min: &Self, max: &Self, domain: &StringDomain) -> f64 {
        let shared = common_prefix_length(min, max);
        let min_repr = domain.to_number(&min[shared..]);
        let max_repr = domain.to_number(&max[shared..]);
        (max_repr - min_repr + 1) as f64
    }

    fn share_below(min: &Self, max: &Self, value: &Self, domain: &StringDomain) -> f64 {
        let shared = common_prefix_length(min, max);
        debug_assert!(
            value.as_bytes().starts_with(&min.as_bytes()[..shared.min(value.len())]),
            "value does not belong to the interval"
        );
        let value_repr = domain.to_number(&value[shared.min(value.len())..]);
        let min_repr = domain.to_number(&min[shared..]);
        (value_repr.saturating_sub(min_repr)) as f64 / Self::interval_width(min, max, domain)
    }

    fn partition_equal_width(
        min: &Self,
        max: &Self,
        bin_count: usize,
        domain: &StringDomain,
    ) -> (Vec<Self>, Vec<Self>) {
        let min_repr = domain.to_number(min);
        let max_repr = domain.to_number(max);
        let span = max_repr - min_repr + 1;
        let width = span.div_ceil(bin_count as u64);

        // Bins of equal width in the prefix-number domain; the last one
        // takes what remains of the span and may be narrower.
        let mut minima = Vec::with_capacity(bin_count);
        let mut maxima = Vec::with_capacity(bin_count);
        let mut cursor = min_repr;
        while cursor <= max_repr {
            let upper_repr = cursor.saturating_add(width - 1).min(max_repr);

            let is_first = cursor == min_repr;
            let is_last = upper_repr == max_repr;
            let candidate_min =
                if is_first { min.clone() } else { domain.from_number(cursor) };
            let candidate_max =
                if is_last { max.clone() } else { domain.from_number(upper_repr) };
            cursor = upper_repr + 1;

            // The number->string round trip is lossy between representable
            // prefixes; keep edges strictly increasing. Interior spans that
            // collapse entirely are dropped (their values land in the
            // neighbouring bins), but the edge bins always survive so the
            // partition is pinned to the distribution extremes.
            let bin_min = match maxima.last() {
                Some(previous) if candidate_min <= *previous => domain.successor(previous),
                _ => candidate_min,
            };
            if candidate_max < bin_min {
                if is_first || is_last {
                    minima.push(bin_min.clone());
                    maxima.push(bin_min);
                }
                continue;
            }
            minima.push(bin_min);
            maxima.push(candidate_max);
        }
        (minima, maxima)
    }

    fn validate(&self, domain: &StringDomain) -> Result<(), StatsError> {
        domain.validate_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowercase(prefix_length: u32) -> StringDomain {
        StringDomain::new("abcdefghijklmnopqrstuvwxyz", prefix_length).unwrap()
    }

    #[test]
    fn test_alphabet_validation() {
        assert!(matches!(
            StringDomain::new("", 4),
            Err(StatsError::InvalidAlphabet(_))
        ));
        assert!(matches!(
            StringDomain::new("zyx", 4),
            Err(StatsError::InvalidAlphabet(_))
        ));
        assert!(matches!(
            StringDomain::new("ac", 4),
            Err(StatsError::InvalidAlphabet(_))
        ));
        assert!(StringDomain::new("abcdefghijklmnopqrstuvwxyz", 4).is_ok());
    }

    #[test]
    fn test_prefix_length_overflow() {
        // 26^13 + 13 fits into 64 bits, 26^14 does not.
        assert!(StringDomain::new("abcdefghijklmnopqrstuvwxyz", 13).is_ok());
        assert!(matches!(
            StringDomain::new("abcdefghijklmnopqrstuvwxyz", 14),
            Err(StatsError::PrefixTooLong { .. })
        ));
        assert!(matches!(
            StringDomain::new("abcdefghijklmnopqrstuvwxyz", 0),
            Err(StatsError::PrefixTooLong { .. })
        ));
    }

    #[test]
    fn test_default_prefix_length_is_maximal() {
        let domain = StringDomain::default();
        assert_eq!(domain.characters(), "abcdefghijklmnopqrstuvwxyz");
        assert_eq!(domain.prefix_length(), 13);
    }

    #[test]
    fn test_to_number_basic() {
        let domain = lowercase(2);
        // "" = 0, "a" = 26, "aa" = 27, "az" = 52, "b" = 52, "zz" = 702.
        assert_eq!(domain.to_number(""), 0);
        assert_eq!(domain.to_number("a"), 26);
        assert_eq!(domain.to_number("aa"), 27);
        assert_eq!(domain.to_number("az"), 52);
        assert_eq!(domain.to_number("zz"), 26 * 26 + 26);
    }

    #[test]
    fn test_to_number_is_monotone() {
        let domain = lowercase(3);
        let words = ["", "a", "aa", "ab", "abc", "abd", "b", "ba", "zzz"];
        for pair in words.windows(2) {
            assert!(
                domain.to_number(pair[0]) <= domain.to_number(pair[1]),
                "{:?} -> {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_to_number_ignores_characters_past_the_prefix() {
        let domain = lowercase(4);
        assert_eq!(domain.to_number("abcd"), domain.to_number("abcdzzzz"));
    }

    #[test]
    fn test_from_number_round_trip() {
        let domain = lowercase(4);
        for word in ["", "a", "abcd", "zzzz", "mn", "bcy"] {
            assert_eq!(domain.from_number(domain.to_number(word)), word);
        }
    }

    #[test]
    fn test_number_collisions_decode_to_the_canonical_form() {
        // "az" and "b" share a number; the decoder picks the shorter form.
        let domain = lowercase(2);
        assert_eq!(domain.to_number("az"), domain.to_number("b"));
        assert_eq!(domain.from_number(domain.to_number("az")), "b");
    }

    #[test]
    fn test_successor_appends_lowest_character() {
        let domain = lowercase(4);
        assert_eq!(domain.successor("abc"), "abca");
        assert_eq!(domain.successor(""), "a");
    }

    #[test]
    fn test_next_value_of_length() {
        let domain = lowercase(4);
        // Shorter than the length: append.
        assert_eq!(domain.next_value_of_length("ab", 4), "aba");
        // Same length: increment the last character.
        assert_eq!(domain.next_value_of_length("abcd", 4), "abce");
        // Carry over maximal characters.
        assert_eq!(domain.next_value_of_length("abzz", 4), "ac");
        // The maximum of the domain maps to itself.
        assert_eq!(domain.next_value_of_length("zzzz", 4), "zzzz");
        // Longer values are truncated first.
        assert_eq!(domain.next_value_of_length("abcdzz", 4), "abce");
        assert_eq!(domain.next_value_of_length("foo", 3), "fop");
    }

    #[test]
    fn test_common_prefix_length() {
        assert_eq!(common_prefix_length("intelligence", "intellij"), 7);
        assert_eq!(common_prefix_length("abc", "abc"), 3);
        assert_eq!(common_prefix_length("abc", "xyz"), 0);
        assert_eq!(common_prefix_length("", "abc"), 0);
    }

    #[test]
    fn test_integer_successor_saturates() {
        assert_eq!(41i32.successor(&()), 42);
        assert_eq!(i32::MAX.successor(&()), i32::MAX);
        assert_eq!(i64::MAX.successor(&()), i64::MAX);
    }

    #[test]
    fn test_integer_interval_width() {
        assert_eq!(i32::interval_width(&10, &19, &()), 10.0);
        assert_eq!(i32::interval_width(&5, &5, &()), 1.0);
        // Extremes do not overflow.
        assert!(i64::interval_width(&i64::MIN, &i64::MAX, &()) > 0.0);
    }

    #[test]
    fn test_integer_share_below() {
        assert_eq!(i32::share_below(&0, &9, &5, &()), 0.5);
        assert_eq!(i32::share_below(&0, &9, &0, &()), 0.0);
    }

    #[test]
    fn test_integer_partition_counts_and_bounds() {
        // Ten units over three bins: four units each, the last narrower.
        let (minima, maxima) = i32::partition_equal_width(&1, &10, 3, &());
        assert_eq!(minima, vec![1, 5, 9]);
        assert_eq!(maxima, vec![4, 8, 10]);

        // More bins than representable values: capped at the span.
        let (minima, maxima) = i32::partition_equal_width(&1, &3, 10, &());
        assert_eq!(minima, vec![1, 2, 3]);
        assert_eq!(maxima, vec![1, 2, 3]);
    }

    #[test]
    fn test_float_partition_covers_range() {
        let (minima, maxima) = f64::partition_equal_width(&0.0, &10.0, 4, &());
        assert_eq!(minima.len(), 4);
        assert_eq!(minima[0], 0.0);
        assert_eq!(*maxima.last().unwrap(), 10.0);
        for i in 1..minima.len() {
            assert!(maxima[i - 1] < minima[i]);
        }
    }

    #[test]
    fn test_float_successor() {
        let x = 1.0f64;
        assert!(x.successor(&()) > x);
        assert_eq!(f64::INFINITY.successor(&()), f64::INFINITY);
    }

    #[test]
    fn test_string_interval_width_strips_common_prefix() {
        let domain = lowercase(4);
        let min = "intelligence".to_string();
        let max = "intellij".to_string();
        // Shared prefix "intelli": width computed over "gence" vs "j".
        let expected =
            domain.to_number("j") - domain.to_number("gence") + 1;
        assert_eq!(
            String::interval_width(&min, &max, &domain),
            expected as f64
        );
    }

    #[test]
    fn test_string_share_below() {
        let domain = lowercase(4);
        let min = "aaaa".to_string();
        let max = "zzzz".to_string();
        let below_min = String::share_below(&min, &max, &"aaaa".to_string(), &domain);
        assert_eq!(below_min, 0.0);
        let mid = String::share_below(&min, &max, &"mmmm".to_string(), &domain);
        assert!(mid > 0.4 && mid < 0.6);
    }

    #[test]
    fn test_string_partition_edges_are_ordered() {
        let domain = lowercase(4);
        let (minima, maxima) =
            String::partition_equal_width(&"aaaa".to_string(), &"zzzz".to_string(), 4, &domain);
        assert_eq!(minima.len(), 4);
        assert_eq!(minima[0], "aaaa");
        assert_eq!(maxima.last().unwrap(), "zzzz");
        for i in 0..minima.len() {
            assert!(minima[i] <= maxima[i]);
            if i > 0 {
                assert!(maxima[i - 1] < minima[i]);
            }
        }
    }
}
