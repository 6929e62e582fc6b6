//! Report summarization over mapped rows.
//!
//! The summarizer finds the amount, date and category fields by name (unless
//! the caller names them), then derives the total, average, covered period
//! and category histogram. Optional members stay `None` when their field is
//! absent; that is different from a zero result.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::{is_empty_cell, parse_amount, parse_loose_date},
    mapping::FieldMapping,
    rows::MappedRow,
};

pub const UNCATEGORIZED: &str = "Uncategorized";

const AMOUNT_HINTS: &[&str] = &["amount", "total"];
const DATE_HINTS: &[&str] = &["date", "time"];
const CATEGORY_HINTS: &[&str] = &["category", "type"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: f64,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeMap<String, usize>>,
}

/// Explicit field choices that bypass name-based discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryOptions {
    pub amount_field: Option<String>,
    pub date_field: Option<String>,
    pub category_field: Option<String>,
}

/// The fields a summary run actually used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryFields {
    pub amount: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
}

/// First mapping key (in insertion order) containing any of `hints`.
fn discover_field(mapping: &FieldMapping, hints: &[&str]) -> Option<String> {
    mapping
        .targets()
        .find(|target| {
            let lowered = target.to_lowercase();
            hints.iter().any(|hint| lowered.contains(hint))
        })
        .map(str::to_string)
}

pub fn resolve_fields(mapping: &FieldMapping, options: &SummaryOptions) -> SummaryFields {
    SummaryFields {
        amount: options
            .amount_field
            .clone()
            .or_else(|| discover_field(mapping, AMOUNT_HINTS)),
        date: options
            .date_field
            .clone()
            .or_else(|| discover_field(mapping, DATE_HINTS)),
        category: options
            .category_field
            .clone()
            .or_else(|| discover_field(mapping, CATEGORY_HINTS)),
    }
}

pub fn generate_financial_summary(
    data: &[MappedRow],
    mapping: &FieldMapping,
    options: &SummaryOptions,
) -> Summary {
    let fields = resolve_fields(mapping, options);
    debug!(
        "Summarizing {} row(s) with amount={:?} date={:?} category={:?}",
        data.len(),
        fields.amount,
        fields.date,
        fields.category
    );

    let mut summary = Summary {
        count: data.len(),
        ..Summary::default()
    };

    if let Some(field) = fields.amount.as_deref() {
        let mut valid_count = 0usize;
        for row in data {
            let raw = row.get(field);
            let parsed = parse_amount(raw);
            summary.total += parsed;
            if parsed != 0.0 || raw.is_some_and(|value| value.is_truthy()) {
                valid_count += 1;
            }
        }
        summary.average = Some(if valid_count > 0 {
            summary.total / valid_count as f64
        } else {
            0.0
        });
    }

    if let Some(field) = fields.date.as_deref() {
        summary.period = period_for(data, field);
    }

    if let Some(field) = fields.category.as_deref() {
        let mut categories = BTreeMap::new();
        for row in data {
            let label = row
                .get(field)
                .filter(|value| value.is_truthy())
                .map(|value| value.as_display())
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            *categories.entry(label).or_insert(0) += 1;
        }
        summary.categories = Some(categories);
    }

    summary
}

fn period_for(data: &[MappedRow], field: &str) -> Option<String> {
    let mut dates = data
        .iter()
        .map(|row| row.get(field))
        .filter(|value| !is_empty_cell(*value))
        .flatten()
        .filter_map(|value| parse_loose_date(value).ok())
        .collect::<Vec<_>>();
    if dates.len() < 2 {
        return None;
    }
    dates.sort();
    let earliest = dates.first()?;
    let latest = dates.last()?;
    Some(format!(
        "{} - {}",
        earliest.format("%Y-%m-%d"),
        latest.format("%Y-%m-%d")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CellValue;

    fn mapped(values: &[&[(&str, Option<&str>)]]) -> Vec<MappedRow> {
        values
            .iter()
            .enumerate()
            .map(|(idx, cells)| MappedRow {
                row_index: idx + 1,
                values: cells
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.map(CellValue::from)))
                    .collect(),
            })
            .collect()
    }

    #[test]
    fn truthy_unparseable_amounts_count_toward_average() {
        let data = mapped(&[
            &[("amt", Some("100"))],
            &[("amt", Some("not-a-number"))],
            &[("amt", Some(""))],
        ]);
        let mapping: FieldMapping = [("amount", "amt")].into_iter().collect();
        let options = SummaryOptions {
            amount_field: Some("amt".into()),
            ..SummaryOptions::default()
        };
        let summary = generate_financial_summary(&data, &mapping, &options);
        assert_eq!(summary.total, 100.0);
        assert_eq!(summary.average, Some(50.0));
        assert_eq!(summary.count, 3);
    }

    #[test]
    fn discovery_uses_first_matching_key() {
        let mapping: FieldMapping = [
            ("subtotal", "S"),
            ("amount", "A"),
            ("created_time", "T"),
            ("type", "K"),
        ]
        .into_iter()
        .collect();
        let fields = resolve_fields(&mapping, &SummaryOptions::default());
        assert_eq!(fields.amount.as_deref(), Some("subtotal"));
        assert_eq!(fields.date.as_deref(), Some("created_time"));
        assert_eq!(fields.category.as_deref(), Some("type"));
    }

    #[test]
    fn missing_fields_leave_optionals_absent() {
        let data = mapped(&[&[("name", Some("Ana"))]]);
        let mapping: FieldMapping = [("name", "Name")].into_iter().collect();
        let summary = generate_financial_summary(&data, &mapping, &SummaryOptions::default());
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, None);
        assert_eq!(summary.period, None);
        assert_eq!(summary.categories, None);

        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"total":0.0,"count":1}"#);
    }

    #[test]
    fn amount_field_without_values_averages_zero() {
        let data = mapped(&[&[("amount", None)]]);
        let mapping: FieldMapping = [("amount", "A")].into_iter().collect();
        let summary = generate_financial_summary(&data, &mapping, &SummaryOptions::default());
        assert_eq!(summary.average, Some(0.0));
    }

    #[test]
    fn period_needs_two_valid_dates() {
        let mapping: FieldMapping = [("date", "D")].into_iter().collect();
        let one = mapped(&[&[("date", Some("2024-03-01"))], &[("date", Some("bad"))]]);
        assert_eq!(
            generate_financial_summary(&one, &mapping, &SummaryOptions::default()).period,
            None
        );

        let many = mapped(&[
            &[("date", Some("2024-03-15"))],
            &[("date", Some("2024-01-02"))],
            &[("date", None)],
            &[("date", Some("2024-02-10T08:00:00"))],
        ]);
        assert_eq!(
            generate_financial_summary(&many, &mapping, &SummaryOptions::default())
                .period
                .as_deref(),
            Some("2024-01-02 - 2024-03-15")
        );
    }

    #[test]
    fn categories_default_to_uncategorized() {
        let data = mapped(&[
            &[("cat", Some("Food"))],
            &[("cat", Some(""))],
            &[("cat", Some("Food"))],
        ]);
        let mapping: FieldMapping = [("category", "cat")].into_iter().collect();
        let options = SummaryOptions {
            category_field: Some("cat".into()),
            ..SummaryOptions::default()
        };
        let summary = generate_financial_summary(&data, &mapping, &options);
        let categories = summary.categories.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories["Food"], 2);
        assert_eq!(categories[UNCATEGORIZED], 1);
    }

    #[test]
    fn categories_present_even_without_rows() {
        let mapping: FieldMapping = [("category", "C")].into_iter().collect();
        let summary = generate_financial_summary(&[], &mapping, &SummaryOptions::default());
        assert_eq!(summary.categories, Some(BTreeMap::new()));
        assert_eq!(summary.count, 0);
    }
}
