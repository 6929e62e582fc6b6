use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{mapping::FieldMapping, template::Template};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MappingCheck {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}

impl MappingCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnCheck {
    pub valid: bool,
    pub missing: Vec<String>,
    pub available: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MappingStats {
    pub total_required: usize,
    pub mapped_required: usize,
    pub total_optional: usize,
    pub mapped_optional: usize,
    pub completion_percentage: u32,
}

/// Every source column referenced by `mapping` must exist in the data.
/// Targets left with an empty source are treated as unmapped.
pub fn validate_mapping(mapping: &FieldMapping, available_columns: &[String]) -> MappingCheck {
    let available = available_columns
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>();
    let mut invalid_columns: Vec<String> = Vec::new();
    for source in mapping.sources() {
        if source.is_empty() || available.contains(source) {
            continue;
        }
        if !invalid_columns.iter().any(|c| c == source) {
            invalid_columns.push(source.to_string());
        }
    }
    if invalid_columns.is_empty() {
        return MappingCheck::ok();
    }
    MappingCheck {
        valid: false,
        error: Some(format!(
            "Columns not found in data: {}",
            invalid_columns.join(", ")
        )),
        invalid_columns,
        missing_fields: Vec::new(),
    }
}

/// Every required field must be mapped to a non-empty source column.
pub fn validate_required_fields(mapping: &FieldMapping, required_fields: &[String]) -> MappingCheck {
    let missing_fields = required_fields
        .iter()
        .filter(|field| mapping.source_for(field).is_none_or(str::is_empty))
        .cloned()
        .collect::<Vec<_>>();
    if missing_fields.is_empty() {
        return MappingCheck::ok();
    }
    MappingCheck {
        valid: false,
        error: Some(format!(
            "Missing required fields: {}",
            missing_fields.join(", ")
        )),
        invalid_columns: Vec::new(),
        missing_fields,
    }
}

/// Pre-flight check that a file carries the columns a template needs,
/// independent of any mapping. Comparison is trimmed and case-insensitive.
pub fn validate_columns(csv_columns: &[String], required_columns: &[String]) -> ColumnCheck {
    let normalized = csv_columns
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect::<HashSet<_>>();
    let missing = required_columns
        .iter()
        .filter(|required| !normalized.contains(&required.trim().to_lowercase()))
        .cloned()
        .collect::<Vec<_>>();
    ColumnCheck {
        valid: missing.is_empty(),
        missing,
        available: csv_columns.to_vec(),
    }
}

pub fn mapping_stats(mapping: &FieldMapping, template: &Template) -> MappingStats {
    let is_mapped = |field: &&String| mapping.source_for(field).is_some_and(|s| !s.is_empty());
    let total_required = template.required_fields.len();
    let total_optional = template.optional_fields.len();
    let mapped_required = template.required_fields.iter().filter(is_mapped).count();
    let mapped_optional = template.optional_fields.iter().filter(is_mapped).count();
    let total = total_required + total_optional;
    let completion_percentage = if total == 0 {
        0
    } else {
        ((mapped_required + mapped_optional) as f64 * 100.0 / total as f64).round() as u32
    };
    MappingStats {
        total_required,
        mapped_required,
        total_optional,
        mapped_optional,
        completion_percentage,
    }
}
