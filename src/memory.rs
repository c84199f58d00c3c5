//! Memory accounting for tables and column subsets.
//!
//! Footprints are computed from the values a column actually holds: numeric,
//! boolean and temporal columns cost their element width per row, while text
//! columns pay for every string's heap bytes on top of the per-row slot. A
//! categorical pays for its code vector plus each distinct value once.

use std::mem::size_of;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    column::{Column, ColumnData, Table},
    dtype::TypeClass,
    error::{OptimizeError, OptimizeResult},
};

pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryReport {
    pub label: String,
    pub bytes: usize,
    pub megabytes: f64,
}

impl MemoryReport {
    pub fn new(label: impl Into<String>, bytes: usize) -> Self {
        Self {
            label: label.into(),
            bytes,
            megabytes: bytes as f64 / BYTES_PER_MEGABYTE,
        }
    }
}

/// Average footprint of the columns sharing one [`TypeClass`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassUsage {
    pub class: TypeClass,
    pub columns: usize,
    pub average_bytes: f64,
    pub average_megabytes: f64,
}

fn text_bytes(value: &Option<String>) -> usize {
    size_of::<Option<String>>() + value.as_ref().map_or(0, String::len)
}

pub fn column_bytes(data: &ColumnData) -> usize {
    match data {
        ColumnData::Int8(v) => v.len() * size_of::<i8>(),
        ColumnData::Int16(v) => v.len() * size_of::<i16>(),
        ColumnData::Int32(v) => v.len() * size_of::<i32>(),
        ColumnData::Int64(v) => v.len() * size_of::<i64>(),
        ColumnData::UInt8(v) => v.len() * size_of::<u8>(),
        ColumnData::UInt16(v) => v.len() * size_of::<u16>(),
        ColumnData::UInt32(v) => v.len() * size_of::<u32>(),
        ColumnData::UInt64(v) => v.len() * size_of::<u64>(),
        ColumnData::Float32(v) => v.len() * size_of::<f32>(),
        ColumnData::Float64(v) => v.len() * size_of::<f64>(),
        ColumnData::Boolean(v) => v.len() * size_of::<bool>(),
        ColumnData::DateTime(v) => v.len() * size_of::<Option<NaiveDateTime>>(),
        ColumnData::String(values) => values.iter().map(text_bytes).sum(),
        ColumnData::Category(categorical) => {
            let codes = categorical.len() * categorical.codes().width();
            let dictionary: usize = categorical
                .categories()
                .iter()
                .map(|value| size_of::<String>() + value.len())
                .sum();
            codes + dictionary
        }
    }
}

/// Footprint of any column subset. An empty subset measures zero bytes.
pub fn measure<'a, I>(label: impl Into<String>, columns: I) -> MemoryReport
where
    I: IntoIterator<Item = &'a Column>,
{
    let bytes = columns.into_iter().map(|c| column_bytes(&c.data)).sum();
    MemoryReport::new(label, bytes)
}

pub fn measure_table(label: impl Into<String>, table: &Table) -> MemoryReport {
    measure(label, table.columns())
}

/// One report per column, labelled with the column name.
pub fn measure_columns(table: &Table) -> Vec<MemoryReport> {
    table
        .columns()
        .iter()
        .map(|column| MemoryReport::new(column.name.clone(), column_bytes(&column.data)))
        .collect()
}

/// Percentage saved going from `original` to `optimized`.
pub fn percent_reduction(original: &MemoryReport, optimized: &MemoryReport) -> OptimizeResult<f64> {
    if original.bytes == 0 {
        return Err(OptimizeError::ZeroByteOriginal {
            label: original.label.clone(),
        });
    }
    let saved = original.bytes as f64 - optimized.bytes as f64;
    Ok(saved / original.bytes as f64 * 100.0)
}

/// Reduction between two paired subsets holding the same columns in the same order.
pub fn reduction(original: &[&Column], optimized: &[&Column]) -> OptimizeResult<f64> {
    let names = |cols: &[&Column]| {
        cols.iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };
    let paired = original.len() == optimized.len()
        && original
            .iter()
            .zip(optimized)
            .all(|(before, after)| before.name == after.name && before.len() == after.len());
    if !paired {
        return Err(OptimizeError::ShapeMismatch {
            original: names(original),
            optimized: names(optimized),
        });
    }
    let label = names(original);
    percent_reduction(
        &measure(label.clone(), original.iter().copied()),
        &measure(label, optimized.iter().copied()),
    )
}

pub fn usage_by_class(table: &Table) -> Vec<ClassUsage> {
    TypeClass::ALL
        .iter()
        .map(|class| {
            let selected = table.select(*class);
            let total = measure(class.as_str(), selected.iter().copied()).bytes;
            let average_bytes = if selected.is_empty() {
                0.0
            } else {
                total as f64 / selected.len() as f64
            };
            ClassUsage {
                class: *class,
                columns: selected.len(),
                average_bytes,
                average_megabytes: average_bytes / BYTES_PER_MEGABYTE,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Categorical;

    #[test]
    fn empty_subset_measures_zero() {
        let report = measure("nothing", std::iter::empty::<&Column>());
        assert_eq!(report.bytes, 0);
        assert_eq!(report.megabytes, 0.0);
    }

    #[test]
    fn numeric_columns_cost_their_width() {
        assert_eq!(column_bytes(&ColumnData::Int64(vec![0; 10])), 80);
        assert_eq!(column_bytes(&ColumnData::UInt8(vec![0; 10])), 10);
        assert_eq!(column_bytes(&ColumnData::Float32(vec![0.0; 4])), 16);
    }

    #[test]
    fn text_counts_heap_bytes() {
        let slot = size_of::<Option<String>>();
        let data = ColumnData::String(vec![Some("abc".into()), None, Some("hello".into())]);
        assert_eq!(column_bytes(&data), 3 * slot + 8);
    }

    #[test]
    fn categorical_stores_each_value_once() {
        let values: Vec<Option<String>> = (0..100).map(|i| Some(format!("k{}", i % 2))).collect();
        let data = ColumnData::Category(Categorical::encode(&values));
        assert_eq!(column_bytes(&data), 100 + 2 * (size_of::<String>() + 2));
    }

    #[test]
    fn megabytes_divide_by_binary_megabyte() {
        let report = MemoryReport::new("x", 2 * 1024 * 1024);
        assert_eq!(report.megabytes, 2.0);
    }

    #[test]
    fn reduction_of_zero_byte_original_is_an_error() {
        let original = MemoryReport::new("ints", 0);
        let optimized = MemoryReport::new("ints", 0);
        assert_eq!(
            percent_reduction(&original, &optimized),
            Err(OptimizeError::ZeroByteOriginal {
                label: "ints".into()
            })
        );
    }

    #[test]
    fn reduction_compares_paired_subsets() {
        let before = Column::new("n", ColumnData::Int64(vec![1, 2, 3, 4]));
        let after = Column::new("n", ColumnData::Int8(vec![1, 2, 3, 4]));
        let percent = reduction(&[&before], &[&after]).unwrap();
        assert!((percent - 87.5).abs() < 1e-9);
    }

    #[test]
    fn reduction_rejects_unpaired_subsets() {
        let before = Column::new("n", ColumnData::Int64(vec![1]));
        let after = Column::new("m", ColumnData::Int8(vec![1]));
        assert!(matches!(
            reduction(&[&before], &[&after]),
            Err(OptimizeError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn usage_by_class_averages_per_column() {
        let table = Table::new(vec![
            Column::new("a", ColumnData::Int64(vec![1, 2])),
            Column::new("b", ColumnData::Int8(vec![1, 2])),
        ])
        .unwrap();
        let usage = usage_by_class(&table);
        let integers = usage
            .iter()
            .find(|u| u.class == TypeClass::Integer)
            .unwrap();
        assert_eq!(integers.columns, 2);
        assert_eq!(integers.average_bytes, 9.0);
        let floats = usage.iter().find(|u| u.class == TypeClass::Float).unwrap();
        assert_eq!(floats.columns, 0);
        assert_eq!(floats.average_bytes, 0.0);
    }
}
