// ============================================================================
// Errors
// ============================================================================

use opalsql_types::DataType;

/// Errors raised by histogram construction and by malformed query arguments.
///
/// Query paths that receive well-formed arguments never fail; everything here
/// reports a construction problem or an argument the histogram cannot accept.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    /// A value's tag disagrees with the histogram's element type.
    TypeMismatch { expected: DataType, actual: Option<DataType> },
    /// The supported-characters set is empty, unsorted, non-contiguous, or
    /// not ASCII.
    InvalidAlphabet(String),
    /// `K^L + L` does not fit into 64 bits (or `L` is zero).
    PrefixTooLong { alphabet_size: usize, prefix_length: u32 },
    /// A segment or query string contains a character outside the supported
    /// set.
    UnsupportedCharacter(char),
    /// `%` or `_` appeared in a value for a predicate other than (NOT) LIKE.
    WildcardWhereForbidden(char),
    /// More bins were requested than the distribution can populate.
    TooFewValues { requested: usize, distinct: usize },
    /// `slice_with_predicate` was called with a predicate that matches
    /// nothing.
    EmptySlice,
    /// `slice_with_predicate` does not support (NOT) LIKE.
    UnsupportedSlice,
    /// (NOT) LIKE on a non-string histogram.
    UnsupportedPredicate,
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::TypeMismatch { expected, actual } => match actual {
                Some(actual) => {
                    write!(f, "Type mismatch: histogram is {}, value is {}", expected, actual)
                }
                None => write!(f, "Type mismatch: histogram is {}, value is NULL", expected),
            },
            StatsError::InvalidAlphabet(reason) => {
                write!(f, "Invalid supported-characters set: {}", reason)
            }
            StatsError::PrefixTooLong { alphabet_size, prefix_length } => {
                write!(
                    f,
                    "Prefix length {} is not usable with {} supported characters",
                    prefix_length, alphabet_size
                )
            }
            StatsError::UnsupportedCharacter(c) => {
                write!(f, "Character '{}' is not in the supported set", c)
            }
            StatsError::WildcardWhereForbidden(c) => {
                write!(f, "Wildcard '{}' is only allowed in LIKE patterns", c)
            }
            StatsError::TooFewValues { requested, distinct } => {
                write!(
                    f,
                    "Cannot build {} bins from {} distinct values",
                    requested, distinct
                )
            }
            StatsError::EmptySlice => {
                write!(f, "Slicing with a predicate that matches no rows")
            }
            StatsError::UnsupportedSlice => {
                write!(f, "Slicing does not support (NOT) LIKE predicates")
            }
            StatsError::UnsupportedPredicate => {
                write!(f, "(NOT) LIKE is not supported for non-string columns")
            }
        }
    }
}

impl std::error::Error for StatsError {}
