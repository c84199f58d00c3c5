//! Reads a delimited file into a [`Table`].
//!
//! Without a type map every column receives a wide default type (boolean,
//! 64-bit integer, 64-bit float, datetime or string, in that order of
//! preference). With a [`ColumnTypeMap`] each mapped column is parsed straight
//! into its declared type, which is how an optimization result is reused on a
//! later load.

use std::{path::Path, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};

use crate::{
    column::{Categorical, Column, ColumnData, Table},
    dtype::DataType,
    error::{LoadError, LoadResult},
    io_utils,
    type_map::ColumnTypeMap,
};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    /// Declared types for some or all columns; the rest are inferred.
    pub types: Option<ColumnTypeMap>,
    /// Read at most this many data rows.
    pub row_limit: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
            types: None,
            row_limit: None,
        }
    }
}

pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

fn is_missing(cell: &str) -> bool {
    cell.trim().is_empty()
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_float(cell: &str) -> Option<f64> {
    if is_missing(cell) {
        Some(f64::NAN)
    } else {
        cell.trim().parse().ok()
    }
}

fn text_values(cells: &[String]) -> Vec<Option<String>> {
    cells
        .iter()
        .map(|cell| (!is_missing(cell)).then(|| cell.clone()))
        .collect()
}

/// Default wide type for a column of raw cells.
pub fn infer_column(cells: &[String]) -> ColumnData {
    let present: Vec<&str> = cells
        .iter()
        .filter(|cell| !is_missing(cell))
        .map(|cell| cell.trim())
        .collect();
    let has_missing = present.len() < cells.len();

    if present.is_empty() {
        return ColumnData::Float64(vec![f64::NAN; cells.len()]);
    }
    if !has_missing
        && let Some(flags) = cells.iter().map(|c| parse_bool(c)).collect::<Option<Vec<_>>>()
    {
        return ColumnData::Boolean(flags);
    }
    // Integers with gaps need NaN, so only gap-free integer columns stay integral.
    if !has_missing
        && let Ok(values) = cells
            .iter()
            .map(|c| c.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
    {
        return ColumnData::Int64(values);
    }
    if let Some(values) = cells.iter().map(|c| parse_float(c)).collect::<Option<Vec<_>>>() {
        return ColumnData::Float64(values);
    }
    if present.iter().all(|v| parse_datetime(v).is_some()) {
        return ColumnData::DateTime(cells.iter().map(|c| parse_datetime(c.trim())).collect());
    }
    ColumnData::String(text_values(cells))
}

macro_rules! parse_required {
    ($cells:expr, $name:expr, $first_row:expr, $dtype:expr, $ty:ty, $variant:ident) => {
        $cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                cell.trim().parse::<$ty>().map_err(|_| LoadError::Parse {
                    row: $first_row + idx,
                    column: $name.to_string(),
                    value: cell.clone(),
                    datatype: $dtype,
                })
            })
            .collect::<LoadResult<Vec<_>>>()
            .map(ColumnData::$variant)
    };
}

/// Parses raw cells as `dtype`. `first_row` is the file line of `cells[0]`.
pub fn parse_column(
    name: &str,
    cells: &[String],
    dtype: DataType,
    first_row: usize,
) -> LoadResult<ColumnData> {
    let parse_error = |idx: usize, cell: &String| LoadError::Parse {
        row: first_row + idx,
        column: name.to_string(),
        value: cell.clone(),
        datatype: dtype,
    };
    match dtype {
        DataType::Int8 => parse_required!(cells, name, first_row, dtype, i8, Int8),
        DataType::Int16 => parse_required!(cells, name, first_row, dtype, i16, Int16),
        DataType::Int32 => parse_required!(cells, name, first_row, dtype, i32, Int32),
        DataType::Int64 => parse_required!(cells, name, first_row, dtype, i64, Int64),
        DataType::UInt8 => parse_required!(cells, name, first_row, dtype, u8, UInt8),
        DataType::UInt16 => parse_required!(cells, name, first_row, dtype, u16, UInt16),
        DataType::UInt32 => parse_required!(cells, name, first_row, dtype, u32, UInt32),
        DataType::UInt64 => parse_required!(cells, name, first_row, dtype, u64, UInt64),
        DataType::Float32 => cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                if is_missing(cell) {
                    Ok(f32::NAN)
                } else {
                    cell.trim().parse::<f32>().map_err(|_| parse_error(idx, cell))
                }
            })
            .collect::<LoadResult<Vec<_>>>()
            .map(ColumnData::Float32),
        DataType::Float64 => cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| parse_float(cell).ok_or_else(|| parse_error(idx, cell)))
            .collect::<LoadResult<Vec<_>>>()
            .map(ColumnData::Float64),
        DataType::Boolean => cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| parse_bool(cell).ok_or_else(|| parse_error(idx, cell)))
            .collect::<LoadResult<Vec<_>>>()
            .map(ColumnData::Boolean),
        DataType::DateTime => cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                if is_missing(cell) {
                    Ok(None)
                } else {
                    parse_datetime(cell.trim())
                        .map(Some)
                        .ok_or_else(|| parse_error(idx, cell))
                }
            })
            .collect::<LoadResult<Vec<_>>>()
            .map(ColumnData::DateTime),
        DataType::String => Ok(ColumnData::String(text_values(cells))),
        DataType::Category => Ok(ColumnData::Category(Categorical::encode(&text_values(
            cells,
        )))),
    }
}

/// Loads `path` into memory.
///
/// A missing file is [`LoadError::NotFound`]; a header without data rows is
/// [`LoadError::NoRows`], since nothing downstream can reason about an empty table.
pub fn load_table(path: &Path, options: &LoadOptions) -> LoadResult<Table> {
    let mut reader = io_utils::open_csv_reader(path, options.delimiter)?;
    let header_record = reader.byte_headers()?.clone();
    let headers = io_utils::decode_record(&header_record, options.encoding, 1)?;

    if let Some(types) = &options.types
        && let Some((unknown, _)) = types
            .iter()
            .find(|(name, _)| !headers.iter().any(|h| h == name))
    {
        return Err(LoadError::UnknownColumn(unknown.to_string()));
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut record = csv::ByteRecord::new();
    let mut rows = 0usize;
    while options.row_limit.is_none_or(|limit| rows < limit)
        && reader.read_byte_record(&mut record)?
    {
        let decoded = io_utils::decode_record(&record, options.encoding, rows + 2)?;
        for (column, value) in cells.iter_mut().zip(decoded) {
            column.push(value);
        }
        rows += 1;
    }
    if rows == 0 {
        return Err(LoadError::NoRows(path.to_path_buf()));
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| -> LoadResult<Column> {
            let declared = options.types.as_ref().and_then(|types| types.get(&name));
            let data = match declared {
                Some(dtype) => parse_column(&name, &values, dtype, 2)?,
                None => infer_column(&values),
            };
            debug!("Loaded column '{name}' as {}", data.data_type());
            Ok(Column::new(name, data))
        })
        .collect::<LoadResult<Vec<_>>>()?;
    let table = Table::new(columns)?;
    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        table.row_count(),
        table.column_count(),
        path
    );
    Ok(table)
}

/// Parses comma separated `name:type` pairs into a type map.
pub fn parse_type_overrides(specs: &[String]) -> anyhow::Result<ColumnTypeMap> {
    let mut entries = Vec::new();
    for token in specs.iter().flat_map(|s| s.split(',')) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (name, dtype) = token.split_once(':').ok_or_else(|| {
            anyhow::anyhow!("Type override '{token}' must use the form name:type")
        })?;
        entries.push((name.trim().to_string(), DataType::from_str(dtype)?));
    }
    ColumnTypeMap::from_entries(entries)
}
