//! Composes the numeric and categorical passes into one optimized table.
//!
//! The source table is only ever borrowed. Each pass receives the subset of
//! columns it is responsible for and returns new columns, which are slotted
//! back into their original positions. Columns of any other class (boolean,
//! temporal, categorical) are copied through as they are.

use std::{collections::HashMap, fmt};

use log::info;
use serde::Serialize;

use crate::{
    categorical::{self, DEFAULT_CATEGORY_THRESHOLD},
    column::{Column, Table},
    decision::{ColumnDecision, Narrowed},
    dtype::TypeClass,
    error::{OptimizeError, OptimizeResult},
    memory::{self, MemoryReport},
    numeric::{self, DEFAULT_FLOAT_TOLERANCE},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeOptions {
    /// Uniqueness ratio below which text becomes categorical.
    pub category_threshold: f64,
    /// Absolute error allowed when rounding a float to 32 bits.
    pub float_tolerance: f64,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            category_threshold: DEFAULT_CATEGORY_THRESHOLD,
            float_tolerance: DEFAULT_FLOAT_TOLERANCE,
        }
    }
}

impl OptimizeOptions {
    pub fn validate(&self) -> OptimizeResult<()> {
        let threshold = self.category_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(OptimizeError::InvalidThreshold(threshold));
        }
        let tolerance = self.float_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(OptimizeError::InvalidTolerance(tolerance));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnGroup {
    Integer,
    Float,
    Text,
}

impl ColumnGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnGroup::Integer => "integer",
            ColumnGroup::Float => "float",
            ColumnGroup::Text => "text",
        }
    }
}

impl fmt::Display for ColumnGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Before/after accounting for one subset of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub before: MemoryReport,
    pub after: MemoryReport,
    /// Percentage saved; absent when the subset has no columns.
    pub reduction: Option<f64>,
}

impl Comparison {
    fn between(label: &str, before: &[&Column], after: &[&Column]) -> OptimizeResult<Self> {
        let before_report = memory::measure(label, before.iter().copied());
        let after_report = memory::measure(label, after.iter().copied());
        let reduction = if before.is_empty() {
            None
        } else {
            Some(memory::reduction(before, after)?)
        };
        Ok(Self {
            before: before_report,
            after: after_report,
            reduction,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub group: ColumnGroup,
    pub memory: Comparison,
    pub decisions: Vec<ColumnDecision>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub groups: Vec<GroupReport>,
    pub overall: Comparison,
}

impl OptimizationReport {
    pub fn group(&self, group: ColumnGroup) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.group == group)
    }

    pub fn decisions(&self) -> impl Iterator<Item = &ColumnDecision> {
        self.groups.iter().flat_map(|g| g.decisions.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Optimized {
    pub table: Table,
    pub report: OptimizationReport,
}

fn group_report(
    group: ColumnGroup,
    originals: &[&Column],
    narrowed: &[Narrowed],
) -> OptimizeResult<GroupReport> {
    let replacements: Vec<&Column> = narrowed.iter().map(|n| &n.column).collect();
    let memory = Comparison::between(group.as_str(), originals, &replacements)?;
    if let Some(percent) = memory.reduction {
        info!(
            "{} {group} column(s): {:.2} MB -> {:.2} MB ({percent:.1}% reduction)",
            originals.len(),
            memory.before.megabytes,
            memory.after.megabytes
        );
    }
    Ok(GroupReport {
        group,
        memory,
        decisions: narrowed.iter().map(|n| n.decision.clone()).collect(),
    })
}

/// Builds the narrowest representation of `table` and the accounting behind it.
///
/// The result has the same row count and the same column names in the same
/// order as the input; only declared types may differ.
pub fn optimize(table: &Table, options: &OptimizeOptions) -> OptimizeResult<Optimized> {
    options.validate()?;
    if table.column_count() > 0 && table.row_count() == 0 {
        return Err(OptimizeError::ZeroRowTable);
    }

    let integers = table.select(TypeClass::Integer);
    let floats = table.select(TypeClass::Float);
    let text = table.select(TypeClass::String);

    let narrowed_integers = numeric::downsize_integers(&integers);
    let narrowed_floats = numeric::downsize_floats(&floats, options.float_tolerance);
    let narrowed_text = categorical::downsize_text(&text, options.category_threshold)?;

    let groups = vec![
        group_report(ColumnGroup::Integer, &integers, &narrowed_integers)?,
        group_report(ColumnGroup::Float, &floats, &narrowed_floats)?,
        group_report(ColumnGroup::Text, &text, &narrowed_text)?,
    ];

    let mut replacements: HashMap<String, Column> = narrowed_integers
        .into_iter()
        .chain(narrowed_floats)
        .chain(narrowed_text)
        .map(|n| (n.column.name.clone(), n.column))
        .collect();
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            replacements
                .remove(&column.name)
                .unwrap_or_else(|| column.clone())
        })
        .collect();
    let optimized = Table::new(columns)?;

    let before: Vec<&Column> = table.columns().iter().collect();
    let after: Vec<&Column> = optimized.columns().iter().collect();
    let overall = Comparison::between("table", &before, &after)?;
    if let Some(percent) = overall.reduction {
        info!(
            "Table: {:.2} MB -> {:.2} MB ({percent:.1}% reduction)",
            overall.before.megabytes, overall.after.megabytes
        );
    }

    Ok(Optimized {
        table: optimized,
        report: OptimizationReport { groups, overall },
    })
}
