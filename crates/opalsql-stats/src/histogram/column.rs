//! Column histogram facade
//!
//! One histogram type per column segment, polymorphic over the element type
//! behind the [`ScalarValue`] interface. The facade owns the validation that
//! the typed engines assume: value tags must match the element type, string
//! queries must stay inside the supported character set, and wildcards are
//! only legal in (NOT) LIKE patterns. String LIKE queries are routed through
//! the pattern analyzer; every other predicate goes to the shared engine.

use opalsql_types::{DataType, ScalarValue};

use crate::error::StatsError;
use crate::predicate::Predicate;
use crate::segment::ColumnSegment;

use super::domain::{HistogramValue, StringDomain};
use super::equal_distinct_count::EqualDistinctCountHistogram;
use super::equal_height::EqualHeightHistogram;
use super::equal_width::EqualWidthHistogram;
use super::estimator::{Estimate, Histogram};
use super::like;

/// Bin layout strategy used to build a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinLayout {
    /// Every bin holds (nearly) the same number of distinct values.
    EqualDistinctCount,
    /// Every bin covers (nearly) the same span of the value domain.
    EqualWidth,
    /// Every bin holds (nearly) the same number of rows.
    EqualHeight,
}

#[derive(Debug)]
enum TypedHistogram {
    Int(Box<dyn Histogram<i32> + Send + Sync>),
    Bigint(Box<dyn Histogram<i64> + Send + Sync>),
    Float(Box<dyn Histogram<f32> + Send + Sync>),
    Double(Box<dyn Histogram<f64> + Send + Sync>),
    Varchar(Box<dyn Histogram<String> + Send + Sync>),
}

/// A histogram over one column segment.
///
/// Immutable after construction; safe to share across threads.
#[derive(Debug)]
pub struct ColumnHistogram {
    inner: TypedHistogram,
    null_count: u64,
}

impl Clone for ColumnHistogram {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            TypedHistogram::Int(h) => TypedHistogram::Int(h.boxed_clone()),
            TypedHistogram::Bigint(h) => TypedHistogram::Bigint(h.boxed_clone()),
            TypedHistogram::Float(h) => TypedHistogram::Float(h.boxed_clone()),
            TypedHistogram::Double(h) => TypedHistogram::Double(h.boxed_clone()),
            TypedHistogram::Varchar(h) => TypedHistogram::Varchar(h.boxed_clone()),
        };
        ColumnHistogram { inner, null_count: self.null_count }
    }
}

fn build_typed<T, I>(
    values: I,
    layout: BinLayout,
    bin_count: usize,
    domain: T::Domain,
) -> Result<Box<dyn Histogram<T> + Send + Sync>, StatsError>
where
    T: HistogramValue,
    I: IntoIterator<Item = Option<T>>,
{
    Ok(match layout {
        BinLayout::EqualDistinctCount => {
            Box::new(EqualDistinctCountHistogram::from_values(values, bin_count, domain)?)
        }
        BinLayout::EqualWidth => {
            Box::new(EqualWidthHistogram::from_values(values, bin_count, domain)?)
        }
        BinLayout::EqualHeight => {
            Box::new(EqualHeightHistogram::from_values(values, bin_count, domain)?)
        }
    })
}

macro_rules! unwrap_scalar {
    ($name:ident, $variant:ident, $t:ty, $data_type:expr) => {
        fn $name(value: &ScalarValue) -> Result<$t, StatsError> {
            match value {
                ScalarValue::$variant(v) => Ok(v.clone()),
                other => Err(StatsError::TypeMismatch {
                    expected: $data_type,
                    actual: other.data_type(),
                }),
            }
        }
    };
}

unwrap_scalar!(unwrap_int, Int, i32, DataType::Int);
unwrap_scalar!(unwrap_bigint, Bigint, i64, DataType::Bigint);
unwrap_scalar!(unwrap_float, Float, f32, DataType::Float);
unwrap_scalar!(unwrap_double, Double, f64, DataType::Double);

/// Extract and validate a string query value: the tag must be `Varchar`,
/// characters must come from the domain's alphabet, and wildcards are only
/// passed through for (NOT) LIKE.
fn string_query_value<'v>(
    domain: &StringDomain,
    predicate: Predicate,
    value: &'v ScalarValue,
) -> Result<&'v str, StatsError> {
    let ScalarValue::Varchar(value) = value else {
        return Err(StatsError::TypeMismatch {
            expected: DataType::Varchar,
            actual: value.data_type(),
        });
    };
    for c in value.chars() {
        if domain.contains(c) {
            continue;
        }
        if c == like::ANY_CHARS_WILDCARD || c == like::SINGLE_CHAR_WILDCARD {
            if predicate.allows_wildcards() {
                continue;
            }
            return Err(StatsError::WildcardWhereForbidden(c));
        }
        return Err(StatsError::UnsupportedCharacter(c));
    }
    Ok(value)
}

fn numeric_operands<T: HistogramValue>(
    unwrap: fn(&ScalarValue) -> Result<T, StatsError>,
    predicate: Predicate,
    value: &ScalarValue,
    value2: Option<&ScalarValue>,
) -> Result<(T, Option<T>), StatsError> {
    if predicate.allows_wildcards() {
        return Err(StatsError::UnsupportedPredicate);
    }
    Ok((unwrap(value)?, value2.map(unwrap).transpose()?))
}

fn string_operands(
    domain: &StringDomain,
    predicate: Predicate,
    value: &ScalarValue,
    value2: Option<&ScalarValue>,
) -> Result<(String, Option<String>), StatsError> {
    let value = string_query_value(domain, predicate, value)?.to_string();
    let value2 = value2
        .map(|v| string_query_value(domain, predicate, v))
        .transpose()?
        .map(str::to_string);
    Ok((value, value2))
}

impl ColumnHistogram {
    /// Build a histogram over a segment with the given layout.
    ///
    /// `string_domain` configures the alphabet for string segments (default:
    /// lowercase latin with the longest legal prefix) and is ignored for
    /// numeric segments.
    pub fn from_segment(
        segment: &ColumnSegment,
        layout: BinLayout,
        bin_count: usize,
        string_domain: Option<StringDomain>,
    ) -> Result<Self, StatsError> {
        let inner = match segment {
            ColumnSegment::Int { .. } => {
                TypedHistogram::Int(build_typed(segment.iter_int(), layout, bin_count, ())?)
            }
            ColumnSegment::Bigint { .. } => {
                TypedHistogram::Bigint(build_typed(segment.iter_bigint(), layout, bin_count, ())?)
            }
            ColumnSegment::Float { .. } => {
                TypedHistogram::Float(build_typed(segment.iter_float(), layout, bin_count, ())?)
            }
            ColumnSegment::Double { .. } => {
                TypedHistogram::Double(build_typed(segment.iter_double(), layout, bin_count, ())?)
            }
            ColumnSegment::Varchar { .. } => TypedHistogram::Varchar(build_typed(
                segment.iter_varchar(),
                layout,
                bin_count,
                string_domain.unwrap_or_default(),
            )?),
        };

        let histogram = ColumnHistogram {
            // Rows not covered by the histogram are the NULLs. The
            // subtraction saturates: histogram totals are allowed to exceed
            // the segment's row count (see the null-count note in DESIGN.md).
            null_count: (segment.len() as u64).saturating_sub(total_of(&inner)),
            inner,
        };
        tracing::debug!(
            data_type = %histogram.data_type(),
            layout = ?layout,
            bins = histogram.bin_count(),
            total_count = histogram.total_count(),
            "built column histogram"
        );
        Ok(histogram)
    }

    pub fn data_type(&self) -> DataType {
        match &self.inner {
            TypedHistogram::Int(_) => DataType::Int,
            TypedHistogram::Bigint(_) => DataType::Bigint,
            TypedHistogram::Float(_) => DataType::Float,
            TypedHistogram::Double(_) => DataType::Double,
            TypedHistogram::Varchar(_) => DataType::Varchar,
        }
    }

    pub fn minimum(&self) -> ScalarValue {
        match &self.inner {
            TypedHistogram::Int(h) => ScalarValue::Int(*h.minimum()),
            TypedHistogram::Bigint(h) => ScalarValue::Bigint(*h.minimum()),
            TypedHistogram::Float(h) => ScalarValue::Float(*h.minimum()),
            TypedHistogram::Double(h) => ScalarValue::Double(*h.minimum()),
            TypedHistogram::Varchar(h) => ScalarValue::Varchar(h.minimum().clone()),
        }
    }

    pub fn maximum(&self) -> ScalarValue {
        match &self.inner {
            TypedHistogram::Int(h) => ScalarValue::Int(*h.maximum()),
            TypedHistogram::Bigint(h) => ScalarValue::Bigint(*h.maximum()),
            TypedHistogram::Float(h) => ScalarValue::Float(*h.maximum()),
            TypedHistogram::Double(h) => ScalarValue::Double(*h.maximum()),
            TypedHistogram::Varchar(h) => ScalarValue::Varchar(h.maximum().clone()),
        }
    }

    pub fn bin_count(&self) -> usize {
        match &self.inner {
            TypedHistogram::Int(h) => h.bin_count(),
            TypedHistogram::Bigint(h) => h.bin_count(),
            TypedHistogram::Float(h) => h.bin_count(),
            TypedHistogram::Double(h) => h.bin_count(),
            TypedHistogram::Varchar(h) => h.bin_count(),
        }
    }

    pub fn total_count(&self) -> u64 {
        total_of(&self.inner)
    }

    pub fn total_distinct_count(&self) -> u64 {
        match &self.inner {
            TypedHistogram::Int(h) => h.total_distinct_count(),
            TypedHistogram::Bigint(h) => h.total_distinct_count(),
            TypedHistogram::Float(h) => h.total_distinct_count(),
            TypedHistogram::Double(h) => h.total_distinct_count(),
            TypedHistogram::Varchar(h) => h.total_distinct_count(),
        }
    }

    /// NULLs in the source segment, derived as the positions the histogram
    /// does not cover, clamped at zero.
    pub fn null_count(&self) -> u64 {
        self.null_count
    }

    /// Human-readable dump of the layout and bins.
    pub fn description(&self) -> String {
        match &self.inner {
            TypedHistogram::Int(h) => h.description(),
            TypedHistogram::Bigint(h) => h.description(),
            TypedHistogram::Float(h) => h.description(),
            TypedHistogram::Double(h) => h.description(),
            TypedHistogram::Varchar(h) => h.description(),
        }
    }

    /// Sound pruning: `true` only if no row of the segment can match.
    pub fn does_not_contain(
        &self,
        predicate: Predicate,
        value: &ScalarValue,
        value2: Option<&ScalarValue>,
    ) -> Result<bool, StatsError> {
        match &self.inner {
            TypedHistogram::Int(h) => {
                let (v, v2) = numeric_operands(unwrap_int, predicate, value, value2)?;
                h.does_not_contain(predicate, &v, v2.as_ref())
            }
            TypedHistogram::Bigint(h) => {
                let (v, v2) = numeric_operands(unwrap_bigint, predicate, value, value2)?;
                h.does_not_contain(predicate, &v, v2.as_ref())
            }
            TypedHistogram::Float(h) => {
                let (v, v2) = numeric_operands(unwrap_float, predicate, value, value2)?;
                h.does_not_contain(predicate, &v, v2.as_ref())
            }
            TypedHistogram::Double(h) => {
                let (v, v2) = numeric_operands(unwrap_double, predicate, value, value2)?;
                h.does_not_contain(predicate, &v, v2.as_ref())
            }
            TypedHistogram::Varchar(h) => {
                let (v, v2) = string_operands(h.domain(), predicate, value, value2)?;
                match predicate {
                    Predicate::Like => like::does_not_contain_like(h.as_ref(), &v),
                    Predicate::NotLike => like::does_not_contain_not_like(h.as_ref(), &v),
                    _ => h.does_not_contain(predicate, &v, v2.as_ref()),
                }
            }
        }
    }

    /// Estimate the number of rows matching the predicate.
    pub fn estimate_cardinality(
        &self,
        predicate: Predicate,
        value: &ScalarValue,
        value2: Option<&ScalarValue>,
    ) -> Result<Estimate, StatsError> {
        match &self.inner {
            TypedHistogram::Int(h) => {
                let (v, v2) = numeric_operands(unwrap_int, predicate, value, value2)?;
                h.estimate_cardinality(predicate, &v, v2.as_ref())
            }
            TypedHistogram::Bigint(h) => {
                let (v, v2) = numeric_operands(unwrap_bigint, predicate, value, value2)?;
                h.estimate_cardinality(predicate, &v, v2.as_ref())
            }
            TypedHistogram::Float(h) => {
                let (v, v2) = numeric_operands(unwrap_float, predicate, value, value2)?;
                h.estimate_cardinality(predicate, &v, v2.as_ref())
            }
            TypedHistogram::Double(h) => {
                let (v, v2) = numeric_operands(unwrap_double, predicate, value, value2)?;
                h.estimate_cardinality(predicate, &v, v2.as_ref())
            }
            TypedHistogram::Varchar(h) => {
                let (v, v2) = string_operands(h.domain(), predicate, value, value2)?;
                match predicate {
                    Predicate::Like => like::estimate_like(h.as_ref(), &v),
                    Predicate::NotLike => like::estimate_not_like(h.as_ref(), &v),
                    _ => h.estimate_cardinality(predicate, &v, v2.as_ref()),
                }
            }
        }
    }

    /// Estimated fraction of rows matching the predicate.
    pub fn estimate_selectivity(
        &self,
        predicate: Predicate,
        value: &ScalarValue,
        value2: Option<&ScalarValue>,
    ) -> Result<Estimate, StatsError> {
        let estimate = self.estimate_cardinality(predicate, value, value2)?;
        Ok(Estimate {
            value: estimate.value / self.total_count() as f64,
            is_certain: estimate.is_certain,
        })
    }

    /// The histogram of the rows surviving the predicate, as a new
    /// histogram with explicit bins. The source is unchanged.
    pub fn slice_with_predicate(
        &self,
        predicate: Predicate,
        value: &ScalarValue,
        value2: Option<&ScalarValue>,
    ) -> Result<ColumnHistogram, StatsError> {
        let inner = match &self.inner {
            TypedHistogram::Int(h) => {
                let (v, v2) = numeric_operands(unwrap_int, predicate, value, value2)?;
                TypedHistogram::Int(h.slice_with_predicate(predicate, &v, v2.as_ref())?)
            }
            TypedHistogram::Bigint(h) => {
                let (v, v2) = numeric_operands(unwrap_bigint, predicate, value, value2)?;
                TypedHistogram::Bigint(h.slice_with_predicate(predicate, &v, v2.as_ref())?)
            }
            TypedHistogram::Float(h) => {
                let (v, v2) = numeric_operands(unwrap_float, predicate, value, value2)?;
                TypedHistogram::Float(h.slice_with_predicate(predicate, &v, v2.as_ref())?)
            }
            TypedHistogram::Double(h) => {
                let (v, v2) = numeric_operands(unwrap_double, predicate, value, value2)?;
                TypedHistogram::Double(h.slice_with_predicate(predicate, &v, v2.as_ref())?)
            }
            TypedHistogram::Varchar(h) => {
                let (v, v2) = string_operands(h.domain(), predicate, value, value2)?;
                TypedHistogram::Varchar(h.slice_with_predicate(predicate, &v, v2.as_ref())?)
            }
        };
        // A predicate's result set has no NULLs.
        Ok(ColumnHistogram { inner, null_count: 0 })
    }
}

fn total_of(inner: &TypedHistogram) -> u64 {
    match inner {
        TypedHistogram::Int(h) => h.total_count(),
        TypedHistogram::Bigint(h) => h.total_count(),
        TypedHistogram::Float(h) => h.total_count(),
        TypedHistogram::Double(h) => h.total_count(),
        TypedHistogram::Varchar(h) => h.total_count(),
    }
}
