//! Re-keys source rows by target field, tagging each with its 1-based position.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::{
    data::{CellValue, Row},
    mapping::FieldMapping,
};

pub const ROW_INDEX_KEY: &str = "_rowIndex";

/// A row keyed by target field, in mapping order.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub row_index: usize,
    pub values: Vec<(String, Option<CellValue>)>,
}

impl MappedRow {
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }
}

pub fn apply_mapping(rows: &[Row], mapping: &FieldMapping) -> Vec<MappedRow> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| MappedRow {
            row_index: idx + 1,
            values: mapping
                .iter()
                .map(|(target, source)| (target.to_string(), row.get(source).cloned()))
                .collect(),
        })
        .collect()
}

impl Serialize for MappedRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(ROW_INDEX_KEY, &self.row_index)?;
        for (field, value) in &self.values {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MappedRow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = MappedRow;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapped row object with a _rowIndex key")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut row_index = None;
                let mut values = Vec::new();
                while let Some(key) = access.next_key::<String>()? {
                    if key == ROW_INDEX_KEY {
                        row_index = Some(access.next_value::<usize>()?);
                    } else {
                        values.push((key, access.next_value::<Option<CellValue>>()?));
                    }
                }
                let row_index =
                    row_index.ok_or_else(|| serde::de::Error::missing_field(ROW_INDEX_KEY))?;
                Ok(MappedRow { row_index, values })
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}
