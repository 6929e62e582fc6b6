//! Column type inference over sampled cell values.
//!
//! Classification is all-or-nothing per column and runs in a fixed order:
//! date, then currency, then number, falling back to string. The currency
//! check fires when *any* sampled value carries a currency marker, so one
//! `Rp 1000` in an otherwise numeric column makes the whole column currency.

use std::{
    collections::BTreeMap,
    fmt,
    str::FromStr,
    sync::LazyLock,
};

use anyhow::{Result, anyhow};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::data::{CellValue, Row};

static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4})").expect("valid date prefix regex")
});

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(\d+\.?\d*|\.\d+)$").expect("valid numeric literal regex")
});

const CURRENCY_MARKERS: &[&str] = &["Rp", "$", "€", "£", "¥", "IDR", "USD", "EUR"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Date,
    Currency,
    /// Not enough non-empty values to decide.
    Unknown,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Currency => "currency",
            DataType::Unknown => "unknown",
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

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(DataType::String),
            "number" | "numeric" => Ok(DataType::Number),
            "date" => Ok(DataType::Date),
            "currency" | "money" => Ok(DataType::Currency),
            "unknown" => Ok(DataType::Unknown),
            other => Err(anyhow!("Unknown data type '{other}'")),
        }
    }
}

pub fn detect_type<'a, I>(values: I) -> DataType
where
    I: IntoIterator<Item = Option<&'a CellValue>>,
{
    let samples = values
        .into_iter()
        .flatten()
        .filter(|value| !value.is_blank())
        .map(CellValue::as_display)
        .collect::<Vec<_>>();
    if samples.is_empty() {
        return DataType::Unknown;
    }

    if samples.iter().all(|value| DATE_PREFIX.is_match(value)) {
        return DataType::Date;
    }
    if samples.iter().any(|value| has_currency_marker(value)) {
        return DataType::Currency;
    }
    if samples
        .iter()
        .all(|value| NUMERIC_LITERAL.is_match(&value.replace(',', "")))
    {
        return DataType::Number;
    }
    DataType::String
}

pub fn has_currency_marker(value: &str) -> bool {
    CURRENCY_MARKERS.iter().any(|marker| value.contains(marker))
}

/// Infers a type per column across `rows`. Columns are the union of row keys.
pub fn detect_column_types(rows: &[Row]) -> BTreeMap<String, DataType> {
    let mut columns = BTreeMap::new();
    let Some(first) = rows.first() else {
        return columns;
    };
    let mut names = first.keys().cloned().collect::<Vec<_>>();
    for row in &rows[1..] {
        for key in row.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }
    for name in names {
        let detected = detect_type(rows.iter().map(|row| row.get(&name)));
        debug!("Column '{name}' inferred as {detected}");
        columns.insert(name, detected);
    }
    columns
}
