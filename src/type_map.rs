//! Column name to narrowed type mapping.
//!
//! A [`ColumnTypeMap`] is a read-only projection of an optimized table's
//! declared types. Handing it back to the loader lets a later read assign the
//! narrowed types directly instead of repeating the optimization pass.

use std::{fmt, fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::{column::Table, dtype::DataType};

/// Ordered `column -> type` entries; order follows the source table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnTypeMap {
    entries: Vec<(String, DataType)>,
}

/// One entry per column of `table`, keyed by column name.
pub fn derive_type_map(table: &Table) -> ColumnTypeMap {
    ColumnTypeMap {
        entries: table
            .columns()
            .iter()
            .map(|column| (column.name.clone(), column.data_type()))
            .collect(),
    }
}

impl ColumnTypeMap {
    /// Builds a map from explicit entries, rejecting repeated column names.
    pub fn from_entries(entries: Vec<(String, DataType)>) -> Result<Self> {
        if let Some(name) = first_duplicate(&entries) {
            bail!("Duplicate column '{name}' in type map");
        }
        Ok(Self { entries })
    }

    pub fn get(&self, column: &str) -> Option<DataType> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, dtype)| *dtype)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
        self.entries.iter().map(|(name, dtype)| (name.as_str(), *dtype))
    }

    /// Applies `overrides` on top of this map. Existing columns keep their
    /// position; new columns are appended.
    pub fn merge(&mut self, overrides: ColumnTypeMap) {
        for (name, dtype) in overrides.entries {
            match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = dtype,
                None => self.entries.push((name, dtype)),
            }
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing type map to YAML")
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serializing type map to JSON")
    }

    /// Writes JSON when `path` ends in `.json`, YAML otherwise.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = if is_json(path) {
            self.to_json_string()?
        } else {
            self.to_yaml_string()?
        };
        fs::write(path, contents).with_context(|| format!("Writing type map to {path:?}"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Opening type map {path:?}"))?;
        if is_json(path) {
            serde_json::from_str(&contents).with_context(|| format!("Parsing JSON type map {path:?}"))
        } else {
            serde_yaml::from_str(&contents).with_context(|| format!("Parsing YAML type map {path:?}"))
        }
    }
}

fn first_duplicate(entries: &[(String, DataType)]) -> Option<&str> {
    entries
        .iter()
        .enumerate()
        .find(|(idx, (name, _))| entries[..*idx].iter().any(|(seen, _)| seen == name))
        .map(|(_, (name, _))| name.as_str())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

impl Serialize for ColumnTypeMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, dtype) in &self.entries {
            map.serialize_entry(name, dtype)?;
        }
        map.end()
    }
}

struct ColumnTypeMapVisitor;

impl<'de> Visitor<'de> for ColumnTypeMapVisitor {
    type Value = ColumnTypeMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of column names to type names")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(entry) = access.next_entry::<String, DataType>()? {
            entries.push(entry);
        }
        ColumnTypeMap::from_entries(entries).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for ColumnTypeMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ColumnTypeMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, ColumnData};
    use tempfile::tempdir;

    fn sample_map() -> ColumnTypeMap {
        let table = Table::new(vec![
            Column::new("zeta", ColumnData::UInt8(vec![1])),
            Column::new("alpha", ColumnData::Float32(vec![1.0])),
        ])
        .unwrap();
        derive_type_map(&table)
    }

    #[test]
    fn derive_type_map_keeps_table_order() {
        let map = sample_map();
        let entries: Vec<_> = map.iter().collect();
        assert_eq!(
            entries,
            vec![("zeta", DataType::UInt8), ("alpha", DataType::Float32)]
        );
    }

    #[test]
    fn yaml_output_lists_canonical_names_in_order() {
        let yaml = sample_map().to_yaml_string().unwrap();
        assert_eq!(yaml, "zeta: uint8\nalpha: float32\n");
    }

    #[test]
    fn save_and_load_by_extension() {
        let dir = tempdir().expect("temp dir");
        for name in ["types.yml", "types.json"] {
            let path = dir.path().join(name);
            sample_map().save(&path).expect("save type map");
            let loaded = ColumnTypeMap::load(&path).expect("load type map");
            assert_eq!(loaded, sample_map());
        }
    }

    #[test]
    fn merge_replaces_in_place_and_appends() {
        let mut map = sample_map();
        let overrides = ColumnTypeMap::from_entries(vec![
            ("alpha".to_string(), DataType::Float64),
            ("beta".to_string(), DataType::Category),
        ])
        .unwrap();
        map.merge(overrides);
        let entries: Vec<_> = map.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("zeta", DataType::UInt8),
                ("alpha", DataType::Float64),
                ("beta", DataType::Category)
            ]
        );
    }

    #[test]
    fn load_accepts_aliases_and_rejects_duplicates() {
        let map: ColumnTypeMap = serde_yaml::from_str("id: integer\nname: object\n").unwrap();
        assert_eq!(map.get("id"), Some(DataType::Int64));
        assert_eq!(map.get("name"), Some(DataType::String));

        let err = serde_json::from_str::<ColumnTypeMap>(r#"{"a":"int8","a":"int16"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate column"));
    }
}
