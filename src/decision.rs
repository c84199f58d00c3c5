use serde::Serialize;

use crate::{column::Column, dtype::DataType};

/// What drove a column's narrowing decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// Observed integer range.
    IntegerRange { min: i128, max: i128 },
    /// Largest absolute difference seen when rounding values to 32 bits.
    FloatRounding { max_abs_error: f64 },
    /// Distinct values relative to rows.
    Uniqueness {
        distinct: usize,
        rows: usize,
        ratio: f64,
    },
    /// The column holds no values, so nothing could be observed.
    NoValues,
    /// The column already uses the narrowest type this pass can produce.
    AlreadyNarrow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDecision {
    pub column: String,
    pub before: DataType,
    pub after: DataType,
    pub evidence: Evidence,
}

impl ColumnDecision {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// A freshly built replacement column and the decision that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Narrowed {
    pub column: Column,
    pub decision: ColumnDecision,
}

impl Narrowed {
    /// Passes `column` through as a copy, recording why it was kept.
    pub fn unchanged(column: &Column, evidence: Evidence) -> Self {
        Self {
            column: column.clone(),
            decision: ColumnDecision {
                column: column.name.clone(),
                before: column.data_type(),
                after: column.data_type(),
                evidence,
            },
        }
    }
}
