//! Error types for loading tables and optimizing them.

use std::path::PathBuf;

use thiserror::Error;

use crate::dtype::DataType;

/// Errors surfaced by the optimization core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    /// The uniqueness ratio is undefined for a table without rows.
    #[error("Table has no rows; reject empty inputs before optimizing")]
    ZeroRowTable,

    /// A percentage reduction was requested against an empty original.
    #[error("Cannot compute a reduction for '{label}': original footprint is 0 bytes")]
    ZeroByteOriginal { label: String },

    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{name}' has {found} row(s) but the table has {expected}")]
    RaggedColumn {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Category threshold must be within (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Float tolerance must be a finite value of at least 0, got {0}")]
    InvalidTolerance(f64),

    /// Before and after subsets passed to a reduction do not describe the same columns.
    #[error("Subsets are not paired: '{original}' vs '{optimized}'")]
    ShapeMismatch { original: String, optimized: String },
}

/// Errors raised while reading a delimited file into a [`crate::column::Table`].
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Input file {0:?} was not found")]
    NotFound(PathBuf),

    #[error("Input file {0:?} has a header but no data rows")]
    NoRows(PathBuf),

    #[error("Row {row}, column '{column}': cannot parse '{value}' as {datatype}")]
    Parse {
        row: usize,
        column: String,
        value: String,
        datatype: DataType,
    },

    #[error("Row {row}: failed to decode text with encoding {encoding}")]
    Decode { row: usize, encoding: &'static str },

    #[error("Type map names column '{0}' which is not present in the file")]
    UnknownColumn(String),

    #[error(transparent)]
    Table(#[from] OptimizeError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type OptimizeResult<T> = Result<T, OptimizeError>;
pub type LoadResult<T> = Result<T, LoadError>;
