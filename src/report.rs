//! Plain-text rendering of optimization results.
//!
//! Nothing here computes a decision; every function formats structured data
//! produced by the core into aligned grids for the terminal.

use std::fmt::Write as _;

use crate::{
    decision::{ColumnDecision, Evidence},
    memory::{ClassUsage, MemoryReport},
    numeric::{Bounds, ColumnRange},
    optimize::{ColumnGroup, Comparison, OptimizationReport},
    type_map::ColumnTypeMap,
};

/// Column-aligned text grid. Right-aligned columns suit numbers.
pub struct Grid {
    headers: Vec<String>,
    right_aligned: Vec<bool>,
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let right_aligned = vec![false; headers.len()];
        Self {
            headers,
            right_aligned,
            rows: Vec::new(),
        }
    }

    pub fn align_right(mut self, columns: &[usize]) -> Self {
        for idx in columns {
            if let Some(flag) = self.right_aligned.get_mut(*idx) {
                *flag = true;
            }
        }
        self
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut output = String::new();
        let _ = writeln!(output, "{}", self.line(&self.headers, &widths));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let _ = writeln!(output, "{}", self.line(&rule, &widths));
        for row in &self.rows {
            let _ = writeln!(output, "{}", self.line(row, &widths));
        }
        output
    }

    fn line(&self, cells: &[String], widths: &[usize]) -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .zip(&self.right_aligned)
            .map(|((cell, &width), &right)| {
                let cell = cell.replace(['\n', '\r', '\t'], " ");
                if right {
                    format!("{cell:>width$}")
                } else {
                    format!("{cell:<width$}")
                }
            })
            .collect();
        padded.join("  ").trim_end().to_string()
    }
}

pub fn format_megabytes(report: &MemoryReport) -> String {
    format!("{:.2} MB", report.megabytes)
}

pub fn format_percent(percent: Option<f64>) -> String {
    percent.map_or_else(|| "n/a".to_string(), |p| format!("{p:.1} %"))
}

fn format_evidence(evidence: &Evidence) -> String {
    match evidence {
        Evidence::IntegerRange { min, max } => format!("range [{min}, {max}]"),
        Evidence::FloatRounding { max_abs_error } if max_abs_error.is_finite() => {
            format!("max rounding error {max_abs_error:.3e}")
        }
        Evidence::FloatRounding { .. } => "precision would be lost".to_string(),
        Evidence::Uniqueness {
            distinct, ratio, ..
        } => format!("{:.2} % (n={distinct}) unique", ratio * 100.0),
        Evidence::NoValues => "no values".to_string(),
        Evidence::AlreadyNarrow => "already narrow".to_string(),
    }
}

fn render_decisions(decisions: &[ColumnDecision]) -> String {
    let mut grid = Grid::new(["column", "before", "after", "basis"]);
    for decision in decisions {
        grid.push(vec![
            decision.column.clone(),
            decision.before.to_string(),
            decision.after.to_string(),
            format_evidence(&decision.evidence),
        ]);
    }
    grid.render()
}

fn render_comparison(output: &mut String, noun: &str, comparison: &Comparison) {
    let _ = writeln!(
        output,
        "Original {noun} size:  {}",
        format_megabytes(&comparison.before)
    );
    let _ = writeln!(
        output,
        "Optimized {noun} size: {}",
        format_megabytes(&comparison.after)
    );
    let _ = writeln!(
        output,
        "Percent reduction:  {}",
        format_percent(comparison.reduction)
    );
}

pub fn render_optimization(report: &OptimizationReport) -> String {
    let mut output = String::new();
    for group in &report.groups {
        let title = match group.group {
            ColumnGroup::Integer => "Integer",
            ColumnGroup::Float => "Float",
            ColumnGroup::Text => "Text",
        };
        let _ = writeln!(output, "{title} downsizing results:");
        if group.decisions.is_empty() {
            let _ = writeln!(output, "(no {} columns)", group.group);
        } else {
            output.push_str(&render_decisions(&group.decisions));
        }
        render_comparison(&mut output, group.group.as_str(), &group.memory);
        output.push('\n');
    }
    render_comparison(&mut output, "table", &report.overall);
    output
}

pub fn render_type_map(map: &ColumnTypeMap) -> String {
    let mut grid = Grid::new(["column", "type"]);
    for (name, dtype) in map.iter() {
        grid.push(vec![name.to_string(), dtype.to_string()]);
    }
    grid.render()
}

pub fn render_class_usage(usage: &[ClassUsage]) -> String {
    let mut grid = Grid::new(["type", "columns", "avg per column"]).align_right(&[1, 2]);
    for class in usage {
        grid.push(vec![
            class.class.to_string(),
            class.columns.to_string(),
            format!("{:.2} MB", class.average_megabytes),
        ]);
    }
    grid.render()
}

pub fn render_column_usage(reports: &[MemoryReport], total: &MemoryReport) -> String {
    let mut grid = Grid::new(["column", "bytes", "size"]).align_right(&[1, 2]);
    for report in reports.iter().chain(std::iter::once(total)) {
        grid.push(vec![
            report.label.clone(),
            report.bytes.to_string(),
            format_megabytes(report),
        ]);
    }
    grid.render()
}

pub fn render_ranges(ranges: &[ColumnRange]) -> String {
    let mut grid = Grid::new(["column", "type", "min", "max"]).align_right(&[2, 3]);
    for range in ranges {
        let (min, max) = match &range.bounds {
            Bounds::Integer { min, max } => (min.to_string(), max.to_string()),
            Bounds::Float { min, max } => (min.to_string(), max.to_string()),
            Bounds::Empty => (String::new(), String::new()),
        };
        grid.push(vec![range.column.clone(), range.datatype.to_string(), min, max]);
    }
    grid.render()
}
