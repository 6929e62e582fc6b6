mod common;

use std::collections::HashSet;

use common::text_row;
use proptest::prelude::*;
use report_mapper::{
    auto_map::auto_map_columns,
    data::Row,
    mapping::{FieldMapping, reverse_mapping},
    patterns::PatternTable,
    rows::apply_mapping,
    summary::{SummaryOptions, generate_financial_summary},
};

const HEADER_POOL: &[&str] = &[
    "Date",
    "Tanggal",
    "Transaction Date",
    "Amount",
    "Total",
    "Nominal",
    "Category",
    "Kategori",
    "Type",
    "Notes",
    "Status",
    "Qty",
    "Harga Satuan",
    "Nama Barang",
    "Kode",
];

fn header_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            prop::sample::select(HEADER_POOL).prop_map(|header| header.to_string()),
            "[A-Za-z ]{1,14}",
        ],
        0..10,
    )
}

fn unique_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z_]{1,8}", "[A-Z][a-z ]{0,8}"), 0..8).prop_map(|pairs| {
        let mut targets = HashSet::new();
        let mut sources = HashSet::new();
        pairs
            .into_iter()
            .filter(|(target, source)| {
                targets.insert(target.clone()) && sources.insert(source.clone())
            })
            .collect()
    })
}

fn amount_rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (
            prop_oneof!["-?[0-9]{1,6}(\\.[0-9]{1,2})?", "[a-z]{0,4}"],
            prop::sample::select(vec!["2024-01-15", "2023-11-02", "", "31/12/2024"]),
            prop::sample::select(vec!["Food", "Rent", ""]),
        ),
        0..12,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(amount, date, category)| {
                text_row(&[("Amt", amount.as_str()), ("When", date), ("Kind", category)])
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn auto_mapping_is_one_to_one(columns in header_strategy()) {
        let patterns = PatternTable::builtin();
        let result = auto_map_columns(&columns, &patterns);

        let mut seen = HashSet::new();
        for (target, source) in result.mapping.iter() {
            prop_assert!(seen.insert(source.to_string()), "column {} mapped twice", source);
            prop_assert!(patterns.contains_field(target));
            prop_assert!(columns.iter().any(|c| c == source));
        }
        for column in &result.unmatched {
            prop_assert!(!result.mapping.uses_source(column));
        }
    }

    #[test]
    fn row_indexes_run_one_to_n(row_count in 0usize..40) {
        let rows = (0..row_count)
            .map(|idx| text_row(&[("A", idx.to_string().as_str())]))
            .collect::<Vec<_>>();
        let mapping: FieldMapping = [("a", "A"), ("missing", "B")].into_iter().collect();
        let mapped = apply_mapping(&rows, &mapping);
        prop_assert_eq!(mapped.len(), row_count);
        for (position, row) in mapped.iter().enumerate() {
            prop_assert_eq!(row.row_index, position + 1);
            prop_assert!(row.get("missing").is_none());
        }
    }

    #[test]
    fn reverse_mapping_round_trips(pairs in unique_pairs()) {
        let mapping: FieldMapping = pairs.into_iter().collect();
        let reversed = reverse_mapping(&mapping);
        prop_assert_eq!(reversed.len(), mapping.len());
        prop_assert_eq!(reversed.reverse(), mapping);
    }

    #[test]
    fn summary_is_deterministic(rows in amount_rows()) {
        let mapping: FieldMapping = [("amount", "Amt"), ("date", "When"), ("category", "Kind")]
            .into_iter()
            .collect();
        let data = apply_mapping(&rows, &mapping);
        let options = SummaryOptions::default();
        let first = generate_financial_summary(&data, &mapping, &options);
        let second = generate_financial_summary(&data, &mapping, &options);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        prop_assert_eq!(first.count, rows.len());
    }
}
