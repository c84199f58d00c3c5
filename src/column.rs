//! In-memory table model.
//!
//! A [`Table`] is an ordered list of uniquely named [`Column`]s that all share
//! one row count. Each column stores its values in the concrete Rust vector
//! that matches its declared [`DataType`], so narrowing a column means building
//! a new vector of a smaller element type.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDateTime;

use crate::{
    dtype::{DataType, TypeClass},
    error::{OptimizeError, OptimizeResult},
};

/// Per-row references into a categorical's distinct values. `-1` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryCodes {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
}

impl CategoryCodes {
    fn from_indices(indices: Vec<i64>, category_count: usize) -> Self {
        let largest = category_count.saturating_sub(1) as i64;
        // Every index lies within -1..=largest, so the narrowing casts are exact.
        if largest <= i8::MAX as i64 {
            CategoryCodes::Int8(indices.into_iter().map(|code| code as i8).collect())
        } else if largest <= i16::MAX as i64 {
            CategoryCodes::Int16(indices.into_iter().map(|code| code as i16).collect())
        } else if largest <= i32::MAX as i64 {
            CategoryCodes::Int32(indices.into_iter().map(|code| code as i32).collect())
        } else {
            CategoryCodes::Int64(indices)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CategoryCodes::Int8(codes) => codes.len(),
            CategoryCodes::Int16(codes) => codes.len(),
            CategoryCodes::Int32(codes) => codes.len(),
            CategoryCodes::Int64(codes) => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes used by a single code.
    pub fn width(&self) -> usize {
        match self {
            CategoryCodes::Int8(_) => 1,
            CategoryCodes::Int16(_) => 2,
            CategoryCodes::Int32(_) => 4,
            CategoryCodes::Int64(_) => 8,
        }
    }

    pub fn get(&self, row: usize) -> Option<i64> {
        match self {
            CategoryCodes::Int8(codes) => codes.get(row).map(|c| *c as i64),
            CategoryCodes::Int16(codes) => codes.get(row).map(|c| *c as i64),
            CategoryCodes::Int32(codes) => codes.get(row).map(|c| *c as i64),
            CategoryCodes::Int64(codes) => codes.get(row).copied(),
        }
    }
}

/// Dictionary-encoded text: each distinct value stored once, rows hold codes.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    categories: Vec<String>,
    codes: CategoryCodes,
}

impl Categorical {
    /// Encodes `values` with categories in lexical order.
    pub fn encode(values: &[Option<String>]) -> Self {
        let categories: Vec<String> = values
            .iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        let lookup: HashMap<&str, i64> = categories
            .iter()
            .enumerate()
            .map(|(idx, value)| (value.as_str(), idx as i64))
            .collect();
        let indices = values
            .iter()
            .map(|value| match value {
                Some(text) => lookup.get(text.as_str()).copied().unwrap_or(-1),
                None => -1,
            })
            .collect();
        let codes = CategoryCodes::from_indices(indices, categories.len());
        Self { categories, codes }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn codes(&self) -> &CategoryCodes {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        let code = self.codes.get(row)?;
        if code < 0 {
            return None;
        }
        self.categories.get(code as usize).map(String::as_str)
    }

    pub fn decode(&self) -> Vec<Option<String>> {
        (0..self.len())
            .map(|row| self.get(row).map(str::to_string))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    String(Vec<Option<String>>),
    Category(Categorical),
    Boolean(Vec<bool>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

macro_rules! integers_as_i128 {
    ($values:expr) => {
        Box::new($values.iter().map(|v| *v as i128))
    };
}

macro_rules! narrow_integers {
    ($values:expr, $target:ty, $variant:ident) => {
        $values
            .map(<$target>::try_from)
            .collect::<Result<Vec<_>, _>>()
            .ok()
            .map(ColumnData::$variant)
    };
}

impl ColumnData {
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Int8(_) => DataType::Int8,
            ColumnData::Int16(_) => DataType::Int16,
            ColumnData::Int32(_) => DataType::Int32,
            ColumnData::Int64(_) => DataType::Int64,
            ColumnData::UInt8(_) => DataType::UInt8,
            ColumnData::UInt16(_) => DataType::UInt16,
            ColumnData::UInt32(_) => DataType::UInt32,
            ColumnData::UInt64(_) => DataType::UInt64,
            ColumnData::Float32(_) => DataType::Float32,
            ColumnData::Float64(_) => DataType::Float64,
            ColumnData::String(_) => DataType::String,
            ColumnData::Category(_) => DataType::Category,
            ColumnData::Boolean(_) => DataType::Boolean,
            ColumnData::DateTime(_) => DataType::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int8(v) => v.len(),
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::UInt8(v) => v.len(),
            ColumnData::UInt16(v) => v.len(),
            ColumnData::UInt32(v) => v.len(),
            ColumnData::UInt64(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::String(v) => v.len(),
            ColumnData::Category(c) => c.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer values widened to `i128`, which holds every signed and unsigned width.
    pub fn integers(&self) -> Option<Box<dyn Iterator<Item = i128> + '_>> {
        match self {
            ColumnData::Int8(v) => Some(integers_as_i128!(v)),
            ColumnData::Int16(v) => Some(integers_as_i128!(v)),
            ColumnData::Int32(v) => Some(integers_as_i128!(v)),
            ColumnData::Int64(v) => Some(integers_as_i128!(v)),
            ColumnData::UInt8(v) => Some(integers_as_i128!(v)),
            ColumnData::UInt16(v) => Some(integers_as_i128!(v)),
            ColumnData::UInt32(v) => Some(integers_as_i128!(v)),
            ColumnData::UInt64(v) => Some(integers_as_i128!(v)),
            _ => None,
        }
    }

    pub fn floats(&self) -> Option<Box<dyn Iterator<Item = f64> + '_>> {
        match self {
            ColumnData::Float32(v) => Some(Box::new(v.iter().map(|f| *f as f64))),
            ColumnData::Float64(v) => Some(Box::new(v.iter().copied())),
            _ => None,
        }
    }

    /// Rebuilds integer data as `target`, or `None` when any value does not fit
    /// or either side is not an integer type.
    pub fn cast_integers(&self, target: DataType) -> Option<ColumnData> {
        let values = self.integers()?;
        match target {
            DataType::Int8 => narrow_integers!(values, i8, Int8),
            DataType::Int16 => narrow_integers!(values, i16, Int16),
            DataType::Int32 => narrow_integers!(values, i32, Int32),
            DataType::Int64 => narrow_integers!(values, i64, Int64),
            DataType::UInt8 => narrow_integers!(values, u8, UInt8),
            DataType::UInt16 => narrow_integers!(values, u16, UInt16),
            DataType::UInt32 => narrow_integers!(values, u32, UInt32),
            DataType::UInt64 => narrow_integers!(values, u64, UInt64),
            _ => None,
        }
    }

    /// Text values of a generic string column, decoding categoricals as needed.
    pub fn text(&self) -> Option<Vec<Option<String>>> {
        match self {
            ColumnData::String(values) => Some(values.clone()),
            ColumnData::Category(categorical) => Some(categorical.decode()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn class(&self) -> TypeClass {
        self.data.data_type().class()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Builds a table, rejecting duplicate names and columns of differing length.
    pub fn new(columns: Vec<Column>) -> OptimizeResult<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(OptimizeError::DuplicateColumn(column.name.clone()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(ragged) = columns.iter().find(|c| c.len() != expected) {
                return Err(OptimizeError::RaggedColumn {
                    name: ragged.name.clone(),
                    expected,
                    found: ragged.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Borrowed view of the columns belonging to `class`, in table order.
    pub fn select(&self, class: TypeClass) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.class() == class).collect()
    }
}
