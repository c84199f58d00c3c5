//! Integer and floating-point narrowing.
//!
//! Integer narrowing is exact: the target type is chosen from the observed
//! minimum and maximum through the fixed boundary tables below, and the new
//! vector is built with checked conversions. Float narrowing is a best-effort
//! reduction to 32 bits, accepted when every value survives the round trip
//! within an absolute tolerance.

use log::debug;
use serde::Serialize;

use crate::{
    column::{Column, ColumnData, Table},
    decision::{ColumnDecision, Evidence, Narrowed},
    dtype::{DataType, TypeClass},
};

/// Absolute tolerance for accepting a 32-bit float in place of a 64-bit one.
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 5e-4;

const SIGNED_BOUNDS: [(DataType, i128, i128); 4] = [
    (DataType::Int8, i8::MIN as i128, i8::MAX as i128),
    (DataType::Int16, i16::MIN as i128, i16::MAX as i128),
    (DataType::Int32, i32::MIN as i128, i32::MAX as i128),
    (DataType::Int64, i64::MIN as i128, i64::MAX as i128),
];

const UNSIGNED_BOUNDS: [(DataType, i128); 4] = [
    (DataType::UInt8, u8::MAX as i128),
    (DataType::UInt16, u16::MAX as i128),
    (DataType::UInt32, u32::MAX as i128),
    (DataType::UInt64, u64::MAX as i128),
];

/// Smallest integer type holding `min..=max`.
///
/// The signed candidate is the default. An unsigned candidate is taken only
/// for non-negative ranges and only when it is strictly narrower, or when no
/// signed type can hold the range at all.
pub fn narrowest_integer(min: i128, max: i128) -> Option<DataType> {
    let signed = SIGNED_BOUNDS
        .iter()
        .find(|(_, lo, hi)| min >= *lo && max <= *hi)
        .map(|(dtype, _, _)| *dtype);
    let unsigned = if min >= 0 {
        UNSIGNED_BOUNDS
            .iter()
            .find(|(_, hi)| max <= *hi)
            .map(|(dtype, _)| *dtype)
    } else {
        None
    };
    match (signed, unsigned) {
        (Some(s), Some(u)) if u.numeric_width() < s.numeric_width() => Some(u),
        (Some(s), _) => Some(s),
        (None, u) => u,
    }
}

fn integer_range(data: &ColumnData) -> Option<(i128, i128)> {
    data.integers()?.fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
    })
}

/// Narrows every integer column to the smallest type that holds its values exactly.
pub fn downsize_integers(columns: &[&Column]) -> Vec<Narrowed> {
    columns
        .iter()
        .map(|column| {
            let Some((min, max)) = integer_range(&column.data) else {
                return Narrowed::unchanged(column, Evidence::NoValues);
            };
            let evidence = Evidence::IntegerRange { min, max };
            let narrowed = narrowest_integer(min, max)
                .filter(|target| target.numeric_width() <= column.data_type().numeric_width())
                .and_then(|target| column.data.cast_integers(target));
            let Some(data) = narrowed else {
                return Narrowed::unchanged(column, evidence);
            };
            debug!(
                "Column '{}' range [{min}, {max}]: {} -> {}",
                column.name,
                column.data_type(),
                data.data_type()
            );
            Narrowed {
                decision: ColumnDecision {
                    column: column.name.clone(),
                    before: column.data_type(),
                    after: data.data_type(),
                    evidence,
                },
                column: Column::new(column.name.clone(), data),
            }
        })
        .collect()
}

/// Largest rounding error when casting `values` to `f32`, or `None` when some
/// value does not survive the cast within `tolerance`.
pub fn float32_rounding_error<I>(values: I, tolerance: f64) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut worst = 0.0f64;
    for value in values {
        let narrowed = value as f32 as f64;
        if value.is_nan() {
            continue;
        }
        if value.is_infinite() {
            if narrowed != value {
                return None;
            }
            continue;
        }
        if !narrowed.is_finite() {
            return None;
        }
        let error = (narrowed - value).abs();
        if error > tolerance {
            return None;
        }
        worst = worst.max(error);
    }
    Some(worst)
}

/// Narrows 64-bit float columns to 32 bits where the standard tolerance allows.
pub fn downsize_floats(columns: &[&Column], tolerance: f64) -> Vec<Narrowed> {
    columns
        .iter()
        .map(|column| match &column.data {
            ColumnData::Float64(values) => {
                match float32_rounding_error(values.iter().copied(), tolerance) {
                    Some(max_abs_error) => {
                        debug!(
                            "Column '{}' fits float32 (max error {max_abs_error:e})",
                            column.name
                        );
                        let data = ColumnData::Float32(values.iter().map(|v| *v as f32).collect());
                        Narrowed {
                            decision: ColumnDecision {
                                column: column.name.clone(),
                                before: DataType::Float64,
                                after: DataType::Float32,
                                evidence: Evidence::FloatRounding { max_abs_error },
                            },
                            column: Column::new(column.name.clone(), data),
                        }
                    }
                    None => {
                        debug!("Column '{}' keeps float64", column.name);
                        Narrowed::unchanged(
                            column,
                            Evidence::FloatRounding {
                                max_abs_error: f64::INFINITY,
                            },
                        )
                    }
                }
            }
            _ => Narrowed::unchanged(column, Evidence::AlreadyNarrow),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Bounds {
    Integer { min: i128, max: i128 },
    Float { min: f64, max: f64 },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRange {
    pub column: String,
    pub datatype: DataType,
    pub bounds: Bounds,
}

/// Observed minimum and maximum of every numeric column. NaN is ignored.
pub fn numeric_ranges(table: &Table) -> Vec<ColumnRange> {
    table
        .columns()
        .iter()
        .filter(|c| matches!(c.class(), TypeClass::Integer | TypeClass::Float))
        .map(|column| {
            let bounds = if let Some((min, max)) = integer_range(&column.data) {
                Bounds::Integer { min, max }
            } else {
                column
                    .data
                    .floats()
                    .into_iter()
                    .flatten()
                    .filter(|v| !v.is_nan())
                    .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                        None => Some((v, v)),
                        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                    })
                    .map_or(Bounds::Empty, |(min, max)| Bounds::Float { min, max })
            };
            ColumnRange {
                column: column.name.clone(),
                datatype: column.data_type(),
                bounds,
            }
        })
        .collect()
}
