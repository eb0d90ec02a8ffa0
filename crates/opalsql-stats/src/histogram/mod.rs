//! Histograms over column segments
//!
//! A histogram is an ordered sequence of non-overlapping bins, each covering
//! a value interval `[min, max]` and carrying the number of rows (height) and
//! distinct values inside it. Three layout strategies are provided:
//!
//! - Equal distinct count: every bin holds (nearly) the same number of
//!   distinct values; bins hug the data, gaps may separate them
//! - Equal width: every bin covers (nearly) the same span of the value
//!   domain; bins may be empty
//! - Equal height: every bin holds (nearly) the same number of rows
//!
//! All layouts (and the generic explicit-bin histogram produced by slicing)
//! answer queries through the shared [`Histogram`] engine. String histograms
//! additionally carry a [`StringDomain`] that maps string prefixes onto an
//! ordered numeric domain for interval arithmetic.

mod bins;
mod column;
mod domain;
mod equal_distinct_count;
mod equal_height;
mod equal_width;
mod estimator;
mod generic;
mod like;
mod value_distribution;

pub use bins::{BinId, BinSet};
pub use column::{BinLayout, ColumnHistogram};
pub use domain::{common_prefix_length, HistogramValue, StringDomain};
pub use equal_distinct_count::EqualDistinctCountHistogram;
pub use equal_height::EqualHeightHistogram;
pub use equal_width::EqualWidthHistogram;
pub use estimator::{Estimate, Histogram};
pub use generic::GenericHistogram;
pub use like::{contains_wildcard, ANY_CHARS_WILDCARD, SINGLE_CHAR_WILDCARD};
pub use value_distribution::gather_value_distribution;
