use serde::{Deserialize, Serialize};

use crate::{
    data::{CellValue, Row, is_empty_cell, parse_loose_date, strict_number},
    inference::DataType,
    mapping::ColumnMapping,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    /// 1-based row position.
    pub row: usize,
    /// Source column the value came from.
    pub column: String,
    pub message: String,
    pub value: Option<CellValue>,
}

pub fn validate_data(rows: &[Row], mappings: &[ColumnMapping]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (row_idx, row) in rows.iter().enumerate() {
        for mapping in mappings {
            let value = row.get(&mapping.source_column);
            if let Some(message) = check_value(value, mapping) {
                errors.push(ValidationError {
                    row: row_idx + 1,
                    column: mapping.source_column.clone(),
                    message,
                    value: value.cloned(),
                });
            }
        }
    }
    errors
}

fn check_value(value: Option<&CellValue>, mapping: &ColumnMapping) -> Option<String> {
    let field = &mapping.target_field;
    if is_empty_cell(value) {
        return Some(format!("{field} is required"));
    }
    let value = value?;
    match mapping.data_type {
        DataType::Number | DataType::Currency if strict_number(value).is_none() => {
            Some(format!("{field} must be a number"))
        }
        DataType::Date if parse_loose_date(value).is_err() => {
            Some(format!("{field} must be a valid date"))
        }
        _ => None,
    }
}
