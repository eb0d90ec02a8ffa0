//! Columnar segment interface
//!
//! Statistics are built from a single column segment. The segment is stored
//! column-oriented: a typed value vector plus a parallel NULL bitmap, so the
//! builder can stream values without boxing each one. Positions flagged as
//! NULL hold an arbitrary placeholder in the value vector and are skipped by
//! the iterators.

use opalsql_types::{DataType, ScalarValue};

use crate::error::StatsError;

/// Typed column segment data with a NULL bitmap.
#[derive(Debug, Clone)]
pub enum ColumnSegment {
    Int { values: Vec<i32>, nulls: Vec<bool> },
    Bigint { values: Vec<i64>, nulls: Vec<bool> },
    Float { values: Vec<f32>, nulls: Vec<bool> },
    Double { values: Vec<f64>, nulls: Vec<bool> },
    Varchar { values: Vec<String>, nulls: Vec<bool> },
}

macro_rules! segment_constructor {
    ($name:ident, $variant:ident, $t:ty) => {
        pub fn $name(values: Vec<Option<$t>>) -> Self {
            let nulls: Vec<bool> = values.iter().map(|v| v.is_none()).collect();
            let values: Vec<$t> =
                values.into_iter().map(|v| v.unwrap_or_default()).collect();
            ColumnSegment::$variant { values, nulls }
        }
    };
}

impl ColumnSegment {
    segment_constructor!(int, Int, i32);
    segment_constructor!(bigint, Bigint, i64);
    segment_constructor!(float, Float, f32);
    segment_constructor!(double, Double, f64);
    segment_constructor!(varchar, Varchar, String);

    /// Build a segment of the given type from tagged values.
    ///
    /// `Null` values become NULL positions; any other tag that disagrees with
    /// `data_type` is rejected.
    pub fn from_values(
        data_type: DataType,
        values: &[ScalarValue],
    ) -> Result<Self, StatsError> {
        let mismatch = |actual: &ScalarValue| StatsError::TypeMismatch {
            expected: data_type,
            actual: actual.data_type(),
        };

        macro_rules! collect {
            ($variant:ident, $t:ty) => {{
                let mut typed: Vec<Option<$t>> = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        ScalarValue::Null => typed.push(None),
                        ScalarValue::$variant(v) => typed.push(Some(v.clone())),
                        other => return Err(mismatch(other)),
                    }
                }
                typed
            }};
        }

        Ok(match data_type {
            DataType::Int => Self::int(collect!(Int, i32)),
            DataType::Bigint => Self::bigint(collect!(Bigint, i64)),
            DataType::Float => Self::float(collect!(Float, f32)),
            DataType::Double => Self::double(collect!(Double, f64)),
            DataType::Varchar => Self::varchar(collect!(Varchar, String)),
        })
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnSegment::Int { .. } => DataType::Int,
            ColumnSegment::Bigint { .. } => DataType::Bigint,
            ColumnSegment::Float { .. } => DataType::Float,
            ColumnSegment::Double { .. } => DataType::Double,
            ColumnSegment::Varchar { .. } => DataType::Varchar,
        }
    }

    /// Number of positions in the segment, including NULLs.
    pub fn len(&self) -> usize {
        match self {
            ColumnSegment::Int { nulls, .. }
            | ColumnSegment::Bigint { nulls, .. }
            | ColumnSegment::Float { nulls, .. }
            | ColumnSegment::Double { nulls, .. }
            | ColumnSegment::Varchar { nulls, .. } => nulls.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnSegment::Int { nulls, .. }
            | ColumnSegment::Bigint { nulls, .. }
            | ColumnSegment::Float { nulls, .. }
            | ColumnSegment::Double { nulls, .. }
            | ColumnSegment::Varchar { nulls, .. } => {
                nulls.iter().filter(|null| **null).count()
            }
        }
    }
}

macro_rules! segment_iterator {
    ($name:ident, $variant:ident, $t:ty, |$v:ident| $produce:expr) => {
        /// Iterate segment positions as `Some(value)` / `None` (NULL).
        ///
        /// Panics if the segment holds a different type; callers dispatch on
        /// `data_type()` first.
        pub fn $name(&self) -> impl Iterator<Item = Option<$t>> + '_ {
            match self {
                ColumnSegment::$variant { values, nulls } => {
                    values.iter().zip(nulls.iter()).map(|($v, null)| {
                        if *null {
                            None
                        } else {
                            Some($produce)
                        }
                    })
                }
                other => panic!(
                    "requested {} iterator over a {} segment",
                    stringify!($variant),
                    other.data_type()
                ),
            }
        }
    };
}

impl ColumnSegment {
    segment_iterator!(iter_int, Int, i32, |v| *v);
    segment_iterator!(iter_bigint, Bigint, i64, |v| *v);
    segment_iterator!(iter_float, Float, f32, |v| *v);
    segment_iterator!(iter_double, Double, f64, |v| *v);
    segment_iterator!(iter_varchar, Varchar, String, |v| v.clone());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_segment_iteration() {
        let segment = ColumnSegment::int(vec![Some(1), None, Some(3)]);
        assert_eq!(segment.len(), 3);
        assert_eq!(segment.null_count(), 1);
        assert_eq!(segment.data_type(), DataType::Int);

        let values: Vec<Option<i32>> = segment.iter_int().collect();
        assert_eq!(values, vec![Some(1), None, Some(3)]);
    }

    #[test]
    fn test_from_values_accepts_nulls() {
        let segment = ColumnSegment::from_values(
            DataType::Varchar,
            &[
                ScalarValue::Varchar("abc".to_string()),
                ScalarValue::Null,
            ],
        )
        .unwrap();
        assert_eq!(segment.len(), 2);
        assert_eq!(segment.null_count(), 1);
    }

    #[test]
    fn test_from_values_rejects_mismatched_tags() {
        let err = ColumnSegment::from_values(
            DataType::Int,
            &[ScalarValue::Int(1), ScalarValue::Bigint(2)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            StatsError::TypeMismatch {
                expected: DataType::Int,
                actual: Some(DataType::Bigint)
            }
        );
    }

    #[test]
    #[should_panic]
    fn test_typed_iterator_panics_on_wrong_type() {
        let segment = ColumnSegment::int(vec![Some(1)]);
        let _ = segment.iter_double().count();
    }
}
