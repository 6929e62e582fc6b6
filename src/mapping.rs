//! Mapping representations and conversions between them.
//!
//! Two shapes circulate through the system and are easy to confuse:
//!
//! - [`FieldMapping`]: target field → source column. This is the interchange
//!   object that gets persisted and handed to report consumers.
//! - [`SourceMapping`]: source column → target field, the inverse used by
//!   interactive re-mapping.
//!
//! Both keep insertion order, which is significant: the summarizer picks
//! the *first* key that looks like an amount, date or category field.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::inference::DataType;

/// One source column assigned to one target field, with its declared type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub source_column: String,
    pub target_field: String,
    pub data_type: DataType,
}

impl ColumnMapping {
    pub fn new(
        source_column: impl Into<String>,
        target_field: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            source_column: source_column.into(),
            target_field: target_field.into(),
            data_type,
        }
    }
}

/// Insertion-ordered string map; inserting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OrderedPairs {
    entries: Vec<(String, String)>,
}

impl OrderedPairs {
    fn insert(&mut self, key: String, value: String) -> Option<String> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column names")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = OrderedPairs::default();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    pairs.insert(key, value);
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

/// Target field → source column, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    pairs: OrderedPairs,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `source` to `target`, returning the source previously held.
    pub fn insert(&mut self, target: impl Into<String>, source: impl Into<String>) -> Option<String> {
        self.pairs.insert(target.into(), source.into())
    }

    pub fn source_for(&self, target: &str) -> Option<&str> {
        self.pairs.get(target)
    }

    pub fn contains_target(&self, target: &str) -> bool {
        self.pairs.get(target).is_some()
    }

    /// Whether `source` is already claimed by some target.
    pub fn uses_source(&self, source: &str) -> bool {
        self.pairs.iter().any(|(_, s)| s == source)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(t, _)| t)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, s)| s)
    }

    /// `(target, source)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.entries.is_empty()
    }

    pub fn reverse(&self) -> SourceMapping {
        let mut reversed = SourceMapping::new();
        for (target, source) in self.iter() {
            reversed.insert(source, target);
        }
        reversed
    }

    /// Builds a field mapping from the interactive list shape. A later entry
    /// for the same target replaces the earlier one.
    pub fn from_column_mappings(mappings: &[ColumnMapping]) -> Self {
        let mut mapping = Self::new();
        for entry in mappings {
            mapping.insert(entry.target_field.clone(), entry.source_column.clone());
        }
        mapping
    }

    pub fn to_column_mappings<F>(&self, data_type_for: F) -> Vec<ColumnMapping>
    where
        F: Fn(&str) -> DataType,
    {
        self.iter()
            .map(|(target, source)| ColumnMapping::new(source, target, data_type_for(target)))
            .collect()
    }
}

impl<T, S> FromIterator<(T, S)> for FieldMapping
where
    T: Into<String>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (T, S)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (target, source) in iter {
            mapping.insert(target, source);
        }
        mapping
    }
}

impl Serialize for FieldMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.pairs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self {
            pairs: OrderedPairs::deserialize(deserializer)?,
        })
    }
}

/// Source column → target field, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMapping {
    pairs: OrderedPairs,
}

impl SourceMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) -> Option<String> {
        self.pairs.insert(source.into(), target.into())
    }

    pub fn target_for(&self, source: &str) -> Option<&str> {
        self.pairs.get(source)
    }

    /// `(source, target)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.entries.is_empty()
    }

    pub fn reverse(&self) -> FieldMapping {
        let mut reversed = FieldMapping::new();
        for (source, target) in self.iter() {
            reversed.insert(target, source);
        }
        reversed
    }
}

impl Serialize for SourceMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.pairs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SourceMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self {
            pairs: OrderedPairs::deserialize(deserializer)?,
        })
    }
}

pub fn reverse_mapping(mapping: &FieldMapping) -> SourceMapping {
    mapping.reverse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FieldMapping {
        [
            ("date", "Transaction Date"),
            ("amount", "Total"),
            ("category", "Type"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut mapping = sample();
        assert_eq!(mapping.insert("amount", "Net"), Some("Total".to_string()));
        assert_eq!(
            mapping.targets().collect::<Vec<_>>(),
            vec!["date", "amount", "category"]
        );
        assert_eq!(mapping.source_for("amount"), Some("Net"));
    }

    #[test]
    fn serialization_preserves_insertion_order() {
        let mapping: FieldMapping = [("zeta", "Z"), ("alpha", "A")].into_iter().collect();
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"zeta":"Z","alpha":"A"}"#);

        let parsed: FieldMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.targets().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn reverse_twice_is_identity_for_unique_sources() {
        let mapping = sample();
        let reversed = reverse_mapping(&mapping);
        assert_eq!(reversed.target_for("Total"), Some("amount"));
        assert_eq!(reversed.reverse(), mapping);
    }

    #[test]
    fn reverse_collapses_shared_sources() {
        let mapping: FieldMapping = [("amount", "Total"), ("notes", "Total")]
            .into_iter()
            .collect();
        let reversed = mapping.reverse();
        assert_eq!(reversed.len(), 1);
        assert_eq!(reversed.target_for("Total"), Some("notes"));
    }

    #[test]
    fn column_mappings_convert_both_ways() {
        let mapping = sample();
        let list = mapping.to_column_mappings(|target| match target {
            "date" => DataType::Date,
            "amount" => DataType::Currency,
            _ => DataType::String,
        });
        assert_eq!(
            list[1],
            ColumnMapping::new("Total", "amount", DataType::Currency)
        );
        assert_eq!(FieldMapping::from_column_mappings(&list), mapping);

        let json = serde_json::to_value(&list[0]).unwrap();
        assert_eq!(json["sourceColumn"], "Transaction Date");
        assert_eq!(json["dataType"], "date");
    }
}
