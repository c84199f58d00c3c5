//! Declared column types and their canonical names.
//!
//! [`DataType`] is the closed set of representations a column can hold. The
//! canonical lowercase names returned by [`DataType::as_str`] are the values
//! written into a [`crate::type_map::ColumnTypeMap`] and accepted back by the
//! loader, so they double as the on-disk vocabulary of the tool.

use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Category,
    Boolean,
    DateTime,
}

/// Coarse grouping used to partition a table before narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeClass {
    Integer,
    Float,
    String,
    Category,
    Boolean,
    DateTime,
}

impl TypeClass {
    pub const ALL: [TypeClass; 6] = [
        TypeClass::Float,
        TypeClass::Integer,
        TypeClass::String,
        TypeClass::Category,
        TypeClass::Boolean,
        TypeClass::DateTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeClass::Integer => "integer",
            TypeClass::Float => "float",
            TypeClass::String => "string",
            TypeClass::Category => "category",
            TypeClass::Boolean => "boolean",
            TypeClass::DateTime => "datetime",
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::Category => "category",
            DataType::Boolean => "boolean",
            DataType::DateTime => "datetime",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float32",
            "float64", "string", "category", "boolean", "datetime",
        ]
    }

    pub fn class(&self) -> TypeClass {
        match self {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => TypeClass::Integer,
            DataType::Float32 | DataType::Float64 => TypeClass::Float,
            DataType::String => TypeClass::String,
            DataType::Category => TypeClass::Category,
            DataType::Boolean => TypeClass::Boolean,
            DataType::DateTime => TypeClass::DateTime,
        }
    }

    /// Bytes per value for fixed-width numeric types.
    pub fn numeric_width(&self) -> Option<usize> {
        match self {
            DataType::Int8 | DataType::UInt8 => Some(1),
            DataType::Int16 | DataType::UInt16 => Some(2),
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => Some(4),
            DataType::Int64 | DataType::UInt64 | DataType::Float64 => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "int8" | "i8" => Ok(DataType::Int8),
            "int16" | "i16" => Ok(DataType::Int16),
            "int32" | "i32" => Ok(DataType::Int32),
            "int64" | "i64" | "int" | "integer" => Ok(DataType::Int64),
            "uint8" | "u8" => Ok(DataType::UInt8),
            "uint16" | "u16" => Ok(DataType::UInt16),
            "uint32" | "u32" => Ok(DataType::UInt32),
            "uint64" | "u64" => Ok(DataType::UInt64),
            "float32" | "f32" => Ok(DataType::Float32),
            "float64" | "f64" | "float" | "double" => Ok(DataType::Float64),
            "string" | "str" | "text" | "object" => Ok(DataType::String),
            "category" | "categorical" => Ok(DataType::Category),
            "boolean" | "bool" => Ok(DataType::Boolean),
            "datetime" | "datetime64" | "timestamp" | "date" => Ok(DataType::DateTime),
            _ => Err(anyhow!(
                "Unknown column type '{value}'. Supported types: {}",
                DataType::variants().join(", ")
            )),
        }
    }
}

impl Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        DataType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip_through_from_str() {
        for name in DataType::variants() {
            let parsed = DataType::from_str(name).expect("canonical name parses");
            assert_eq!(parsed.as_str(), *name);
        }
    }

    #[test]
    fn aliases_resolve_to_wide_defaults() {
        assert_eq!(DataType::from_str("Integer").unwrap(), DataType::Int64);
        assert_eq!(DataType::from_str(" double ").unwrap(), DataType::Float64);
        assert_eq!(DataType::from_str("object").unwrap(), DataType::String);
        assert_eq!(DataType::from_str("bool").unwrap(), DataType::Boolean);
    }

    #[test]
    fn unknown_names_list_supported_types() {
        let err = DataType::from_str("int128").unwrap_err();
        assert!(err.to_string().contains("Supported types"));
    }

    #[test]
    fn classes_partition_numeric_widths() {
        assert_eq!(DataType::UInt16.class(), TypeClass::Integer);
        assert_eq!(DataType::Float32.class(), TypeClass::Float);
        assert_eq!(DataType::Category.numeric_width(), None);
        assert_eq!(DataType::Int16.numeric_width(), Some(2));
    }
}
