//! Dictionary encoding of low-cardinality text columns.

use itertools::Itertools;
use log::debug;

use crate::{
    column::{Categorical, Column, ColumnData},
    decision::{ColumnDecision, Evidence, Narrowed},
    dtype::DataType,
    error::{OptimizeError, OptimizeResult},
};

/// Columns whose uniqueness ratio falls strictly below this become categorical.
pub const DEFAULT_CATEGORY_THRESHOLD: f64 = 0.5;

/// Distinct value count (a missing value counts once) and ratio to row count.
pub fn uniqueness(values: &[Option<String>]) -> OptimizeResult<(usize, f64)> {
    if values.is_empty() {
        return Err(OptimizeError::ZeroRowTable);
    }
    let distinct = values.iter().map(Option::as_deref).unique().count();
    Ok((distinct, distinct as f64 / values.len() as f64))
}

/// Reclassifies generic text columns as categorical when `ratio < threshold`.
///
/// Columns that are not generic text are passed through untouched. A column
/// without rows has no defined ratio and fails with [`OptimizeError::ZeroRowTable`].
pub fn downsize_text(columns: &[&Column], threshold: f64) -> OptimizeResult<Vec<Narrowed>> {
    columns
        .iter()
        .map(|column| {
            let ColumnData::String(values) = &column.data else {
                return Ok(Narrowed::unchanged(column, Evidence::NoValues));
            };
            let (distinct, ratio) = uniqueness(values)?;
            let evidence = Evidence::Uniqueness {
                distinct,
                rows: values.len(),
                ratio,
            };
            if ratio < threshold {
                debug!(
                    "Column '{}' has {:.2}% (n={distinct}) unique values; converting to category",
                    column.name,
                    ratio * 100.0
                );
                let data = ColumnData::Category(Categorical::encode(values));
                Ok(Narrowed {
                    decision: ColumnDecision {
                        column: column.name.clone(),
                        before: DataType::String,
                        after: DataType::Category,
                        evidence,
                    },
                    column: Column::new(column.name.clone(), data),
                })
            } else {
                debug!(
                    "Column '{}' has {:.2}% (n={distinct}) unique values; left as string",
                    column.name,
                    ratio * 100.0
                );
                Ok(Narrowed::unchanged(column, evidence))
            }
        })
        .collect()
}
