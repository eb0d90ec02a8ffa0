//! Predicate conditions understood by histograms

/// The predicate forms a histogram can reason about.
///
/// `Between` takes a second value; everything else takes one. `Like` and
/// `NotLike` interpret their string value as a pattern where `%` matches any
/// sequence of characters and `_` matches exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    Between,
    Like,
    NotLike,
}

impl Predicate {
    /// Whether `%` and `_` are legal in this predicate's value.
    pub fn allows_wildcards(self) -> bool {
        matches!(self, Predicate::Like | Predicate::NotLike)
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Predicate::Equals => "=",
            Predicate::NotEquals => "<>",
            Predicate::LessThan => "<",
            Predicate::LessThanEquals => "<=",
            Predicate::GreaterThan => ">",
            Predicate::GreaterThanEquals => ">=",
            Predicate::Between => "BETWEEN",
            Predicate::Like => "LIKE",
            Predicate::NotLike => "NOT LIKE",
        };
        write!(f, "{}", name)
    }
}
