//! Column Statistics - Histograms for Cardinality Estimation
//!
//! This crate summarizes the value distribution of a single column segment
//! into a histogram and answers optimizer questions about predicates:
//!
//! - **Pruning**: can a predicate possibly match any row of the segment?
//!   (`does_not_contain` — sound, one-sided: it may say "maybe" for an empty
//!   result, but never "no" for a non-empty one)
//! - **Estimation**: approximately how many rows match (`estimate_cardinality`,
//!   `estimate_selectivity`), with a flag marking exact answers
//! - **Slicing**: derive the histogram of the rows that survive a predicate
//!   (`slice_with_predicate`), used to propagate statistics through a plan
//!
//! Three bin layouts are provided (equal distinct count, equal width, equal
//! height) behind one estimation engine, plus a generic explicit-bin
//! histogram used as the slicing output. The [`ColumnHistogram`] facade wraps
//! all of them behind the column's [`opalsql_types::ScalarValue`] interface.
//!
//! Histograms are immutable after construction and can be read from any
//! number of threads without synchronization.

pub mod error;
pub mod histogram;
pub mod predicate;
pub mod segment;

pub use error::StatsError;
pub use histogram::{
    BinLayout, ColumnHistogram, EqualDistinctCountHistogram, EqualHeightHistogram,
    EqualWidthHistogram, Estimate, GenericHistogram, Histogram, StringDomain,
};
pub use predicate::Predicate;
pub use segment::ColumnSegment;
