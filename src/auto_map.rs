//! Heuristic auto-mapping of source columns onto target fields.
//!
//! Two strategies share the [`MappingStrategy`] interface:
//!
//! - [`StrictStrategy`] scores every (field, column) pair, then assigns
//!   greedily from the best score down. Columns that match nothing are
//!   reported as unmatched and left out of the mapping.
//! - [`PassThroughStrategy`] fills the required fields first and then maps
//!   every remaining column onto a custom field of the same name, so nothing
//!   is dropped.
//!
//! Candidate order is fixed: fields in the order given, columns in input
//! order, then a stable sort on score. Equal scores therefore resolve to the
//! earlier field and then the earlier column.

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    inference::DataType,
    mapping::{ColumnMapping, FieldMapping},
    matcher::{MatchScore, calculate_match_score, normalize_column_name},
    patterns::PatternTable,
};

const DATE_KEYWORDS: &[&str] = &["date", "tanggal", "tgl", "time", "waktu"];
const CURRENCY_KEYWORDS: &[&str] = &[
    "amount", "price", "total", "cost", "harga", "nominal", "biaya", "saldo", "balance", "fee",
];
const NUMBER_KEYWORDS: &[&str] = &["qty", "quantity", "count", "jumlah", "number", "stok", "stock"];

/// Outcome of an auto-mapping run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutoMapping {
    pub mapping: FieldMapping,
    pub confidence: BTreeMap<String, MatchScore>,
    pub data_types: BTreeMap<String, DataType>,
    pub unmatched: Vec<String>,
}

impl AutoMapping {
    /// The mapping in the interactive list shape, in assignment order.
    pub fn column_mappings(&self) -> Vec<ColumnMapping> {
        self.mapping.to_column_mappings(|target| {
            self.data_types
                .get(target)
                .copied()
                .unwrap_or(DataType::String)
        })
    }

    fn assign(&mut self, field: &str, column: &str, score: Option<MatchScore>, data_type: DataType) {
        debug!(
            "Mapped column '{column}' to field '{field}' (score {})",
            score.map_or_else(|| "-".to_string(), |s| s.to_string())
        );
        self.mapping.insert(field, column);
        if let Some(score) = score {
            self.confidence.insert(field.to_string(), score);
        }
        self.data_types.insert(field.to_string(), data_type);
    }
}

pub trait MappingStrategy {
    fn name(&self) -> &'static str;

    /// Maps `columns` onto `fields`, fields given in declaration order.
    fn map(&self, columns: &[String], fields: &[String]) -> AutoMapping;
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    field: &'a str,
    column: &'a str,
    score: MatchScore,
}

/// Server-side mapping: one-to-one, unmatched columns are dropped.
#[derive(Debug, Clone, Copy)]
pub struct StrictStrategy<'a> {
    patterns: &'a PatternTable,
}

impl<'a> StrictStrategy<'a> {
    pub fn new(patterns: &'a PatternTable) -> Self {
        Self { patterns }
    }

    fn candidates<'c>(&self, columns: &'c [String], fields: &'c [String]) -> Vec<Candidate<'c>> {
        let mut candidates = Vec::new();
        for field in fields {
            let Some(patterns) = self.patterns.patterns_for(field) else {
                debug!("No patterns declared for field '{field}'");
                continue;
            };
            for column in columns {
                let score = calculate_match_score(column, patterns);
                if score.is_match() {
                    candidates.push(Candidate {
                        field,
                        column,
                        score,
                    });
                }
            }
        }
        // Stable: ties keep field order, then column order.
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates
    }
}

impl MappingStrategy for StrictStrategy<'_> {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn map(&self, columns: &[String], fields: &[String]) -> AutoMapping {
        let mut result = AutoMapping::default();
        let mut claimed = HashSet::new();

        for candidate in self.candidates(columns, fields) {
            if claimed.contains(candidate.column) || result.mapping.contains_target(candidate.field)
            {
                continue;
            }
            claimed.insert(candidate.column);
            result.assign(
                candidate.field,
                candidate.column,
                Some(candidate.score),
                keyword_data_type(candidate.field),
            );
        }

        result.unmatched = columns
            .iter()
            .filter(|column| !claimed.contains(column.as_str()))
            .cloned()
            .collect();
        result
    }
}

/// Interactive mapping: required fields first, every other column kept as a
/// custom field named after itself.
#[derive(Debug, Clone, Copy)]
pub struct PassThroughStrategy<'a> {
    patterns: &'a PatternTable,
}

impl<'a> PassThroughStrategy<'a> {
    pub fn new(patterns: &'a PatternTable) -> Self {
        Self { patterns }
    }
}

impl MappingStrategy for PassThroughStrategy<'_> {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    fn map(&self, columns: &[String], fields: &[String]) -> AutoMapping {
        let mut result = AutoMapping::default();
        let mut claimed: HashSet<&str> = HashSet::new();

        for field in fields {
            let best = columns
                .iter()
                .filter(|column| !claimed.contains(column.as_str()))
                .map(|column| (column, score_field(self.patterns, field, column)))
                .filter(|(_, score)| score.is_match())
                // max_by keeps the last maximum; reverse so ties favour input order.
                .rev()
                .max_by(|a, b| a.1.cmp(&b.1));
            if let Some((column, score)) = best {
                claimed.insert(column.as_str());
                result.assign(field, column, Some(score), keyword_data_type(field));
            }
        }

        for column in columns.iter().unique() {
            if claimed.contains(column.as_str()) {
                continue;
            }
            let target = free_target_name(&result.mapping, column);
            result.assign(&target, column, None, keyword_data_type(column));
        }
        result
    }
}

fn free_target_name(mapping: &FieldMapping, column: &str) -> String {
    if !mapping.contains_target(column) {
        return column.to_string();
    }
    (2..)
        .map(|n| format!("{column}_{n}"))
        .find(|candidate| !mapping.contains_target(candidate))
        .unwrap_or_else(|| column.to_string())
}

/// Pattern score when the field has patterns, otherwise a name comparison.
fn score_field(patterns: &PatternTable, field: &str, column: &str) -> MatchScore {
    match patterns.patterns_for(field) {
        Some(field_patterns) => calculate_match_score(column, field_patterns),
        None => name_similarity(field, column),
    }
}

fn name_similarity(field: &str, column: &str) -> MatchScore {
    let field = normalize_column_name(field).replace('_', " ");
    let column = normalize_column_name(column).replace('_', " ");
    if field.is_empty() || column.is_empty() {
        MatchScore::None
    } else if field == column {
        MatchScore::Exact
    } else if column.contains(&field) {
        MatchScore::Keyword
    } else {
        MatchScore::None
    }
}

/// Best-effort type from keywords in a field or column name.
pub fn keyword_data_type(name: &str) -> DataType {
    let lowered = name.to_lowercase();
    let has = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));
    if has(DATE_KEYWORDS) {
        DataType::Date
    } else if has(CURRENCY_KEYWORDS) {
        DataType::Currency
    } else if has(NUMBER_KEYWORDS) {
        DataType::Number
    } else {
        DataType::String
    }
}

/// Strict auto-mapping of `columns` over every field in `patterns`.
pub fn auto_map_columns(columns: &[String], patterns: &PatternTable) -> AutoMapping {
    let fields = patterns.field_names().map(str::to_string).collect::<Vec<_>>();
    StrictStrategy::new(patterns).map(columns, &fields)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub column: String,
    pub score: MatchScore,
}

/// Ranked candidate columns for `field`, skipping columns already used as a
/// source anywhere in `current`.
pub fn suggest_mapping(
    field: &str,
    columns: &[String],
    current: &FieldMapping,
    patterns: &PatternTable,
) -> Vec<Suggestion> {
    let mut suggestions = columns
        .iter()
        .unique()
        .filter(|column| !current.uses_source(column))
        .map(|column| Suggestion {
            column: column.clone(),
            score: score_field(patterns, field, column),
        })
        .filter(|suggestion| suggestion.score.is_match())
        .collect::<Vec<_>>();
    suggestions.sort_by(|a, b| b.score.cmp(&a.score));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternSpec;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn maps_financial_headers() {
        let patterns = PatternTable::builtin();
        let result = auto_map_columns(
            &names(&["Transaction Date", "Total Amount", "Category"]),
            &patterns,
        );
        assert_eq!(result.mapping.len(), 3);
        assert_eq!(result.mapping.source_for("date"), Some("Transaction Date"));
        assert_eq!(result.mapping.source_for("amount"), Some("Total Amount"));
        assert_eq!(result.mapping.source_for("category"), Some("Category"));
        for score in result.confidence.values() {
            assert!(score.value() >= 0.8);
        }
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn higher_score_wins_contested_column() {
        let patterns = PatternTable::builtin();
        // "Total" is exact for amount; "Total Qty" is partial for amount and
        // must fall through to quantity.
        let result = auto_map_columns(&names(&["Total Qty", "Total"]), &patterns);
        assert_eq!(result.mapping.source_for("amount"), Some("Total"));
        assert_eq!(result.mapping.source_for("quantity"), Some("Total Qty"));
    }

    #[test]
    fn tied_columns_resolve_to_earlier_column() {
        let patterns = PatternTable::builtin();
        let result = auto_map_columns(&names(&["Total", "Amount"]), &patterns);
        assert_eq!(result.mapping.source_for("amount"), Some("Total"));
        assert_eq!(result.confidence["amount"], MatchScore::Exact);
        assert_eq!(result.unmatched, names(&["Amount"]));

        let result = auto_map_columns(&names(&["Amount", "Total"]), &patterns);
        assert_eq!(result.mapping.source_for("amount"), Some("Amount"));
        assert_eq!(result.unmatched, names(&["Total"]));
    }

    #[test]
    fn tied_fields_resolve_to_earlier_field() {
        let patterns = PatternTable::from_specs(&[
            PatternSpec {
                field: "billing_code".to_string(),
                regex: vec!["^code$".to_string()],
            },
            PatternSpec {
                field: "item_code".to_string(),
                regex: vec!["^code$".to_string()],
            },
        ])
        .unwrap();
        let strategy = StrictStrategy::new(&patterns);
        let columns = names(&["Code"]);

        let result = strategy.map(&columns, &names(&["billing_code", "item_code"]));
        assert_eq!(result.mapping.source_for("billing_code"), Some("Code"));
        assert!(!result.mapping.contains_target("item_code"));

        let result = strategy.map(&columns, &names(&["item_code", "billing_code"]));
        assert_eq!(result.mapping.source_for("item_code"), Some("Code"));
        assert!(!result.mapping.contains_target("billing_code"));
    }

    #[test]
    fn unmatched_columns_are_reported_in_input_order() {
        let patterns = PatternTable::builtin();
        let result = auto_map_columns(&names(&["Foo", "Date", "Bar"]), &patterns);
        assert_eq!(result.unmatched, names(&["Foo", "Bar"]));
        assert_eq!(result.data_types.get("date"), Some(&DataType::Date));
    }

    #[test]
    fn strict_strategy_only_considers_requested_fields() {
        let patterns = PatternTable::builtin();
        let strategy = StrictStrategy::new(&patterns);
        let result = strategy.map(&names(&["Date", "Amount"]), &names(&["amount"]));
        assert_eq!(result.mapping.len(), 1);
        assert_eq!(result.unmatched, names(&["Date"]));
        assert_eq!(strategy.name(), "strict");
    }

    #[test]
    fn pass_through_keeps_every_column() {
        let patterns = PatternTable::builtin();
        let strategy = PassThroughStrategy::new(&patterns);
        let result = strategy.map(
            &names(&["Tanggal", "Nominal", "Unit Cost", "Remarks Extra"]),
            &names(&["date", "amount"]),
        );
        assert_eq!(result.mapping.source_for("date"), Some("Tanggal"));
        assert_eq!(result.mapping.source_for("amount"), Some("Nominal"));
        assert_eq!(result.mapping.source_for("Unit Cost"), Some("Unit Cost"));
        assert_eq!(result.data_types["Unit Cost"], DataType::Currency);
        assert_eq!(result.data_types["Remarks Extra"], DataType::String);
        assert!(result.unmatched.is_empty());
        assert!(!result.confidence.contains_key("Unit Cost"));
        assert_eq!(result.column_mappings().len(), 4);
    }

    #[test]
    fn pass_through_matches_unknown_fields_by_name() {
        let patterns = PatternTable::builtin();
        let strategy = PassThroughStrategy::new(&patterns);
        let result = strategy.map(&names(&["Plate Number", "Driver"]), &names(&["plate_number"]));
        assert_eq!(result.mapping.source_for("plate_number"), Some("Plate Number"));
        assert_eq!(result.confidence["plate_number"], MatchScore::Exact);
        assert_eq!(result.mapping.source_for("Driver"), Some("Driver"));
    }

    #[test]
    fn pass_through_avoids_target_collisions() {
        let patterns = PatternTable::builtin();
        let strategy = PassThroughStrategy::new(&patterns);
        let result = strategy.map(&names(&["Amount", "amount"]), &names(&["amount"]));
        assert_eq!(result.mapping.source_for("amount"), Some("Amount"));
        assert_eq!(result.mapping.source_for("amount_2"), Some("amount"));
    }

    #[test]
    fn suggestions_skip_used_columns_and_rank_by_score() {
        let patterns = PatternTable::builtin();
        let mut current = FieldMapping::new();
        current.insert("amount", "Amount");
        let suggestions = suggest_mapping(
            "date",
            &names(&["Amount", "Posting Date", "Date", "Memo"]),
            &current,
            &patterns,
        );
        let columns = suggestions.iter().map(|s| s.column.as_str()).collect::<Vec<_>>();
        assert_eq!(columns, vec!["Date", "Posting Date"]);
        assert_eq!(suggestions[0].score, MatchScore::Exact);
    }

    #[test]
    fn keyword_types_follow_priority() {
        assert_eq!(keyword_data_type("Payment Date"), DataType::Date);
        assert_eq!(keyword_data_type("Unit Price"), DataType::Currency);
        assert_eq!(keyword_data_type("Qty"), DataType::Number);
        assert_eq!(keyword_data_type("Vendor"), DataType::String);
    }
}
