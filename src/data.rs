//! Cell values and the lenient parsers used for aggregation and validation.

use std::{collections::BTreeMap, fmt};

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One source row keyed by source column name.
pub type Row = BTreeMap<String, CellValue>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// Blank text or a non-finite number carries no usable value.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
        }
    }

    /// Truthiness as seen by report consumers: non-empty text, non-zero numbers.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Text(s) => !s.is_empty(),
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

pub fn is_empty_cell(value: Option<&CellValue>) -> bool {
    value.is_none_or(CellValue::is_blank)
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Reads an amount by keeping only digits, `.` and `-` and taking the longest
/// numeric prefix of what remains. Unparseable input yields `0.0`.
pub fn parse_amount(value: Option<&CellValue>) -> f64 {
    match value {
        None => 0.0,
        Some(CellValue::Number(n)) if n.is_nan() => 0.0,
        Some(CellValue::Number(n)) => *n,
        Some(CellValue::Text(text)) => {
            let stripped = text
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect::<String>();
            parse_float_prefix(&stripped).unwrap_or(0.0)
        }
    }
}

/// Longest prefix of `value` that reads as a decimal number, e.g. `"1.5.2"` → 1.5.
fn parse_float_prefix(value: &str) -> Option<f64> {
    let bytes = value.as_bytes();
    let mut end = 0usize;
    if bytes.first().is_some_and(|b| matches!(b, b'-' | b'+')) {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        if b.is_ascii_digit() {
            seen_digit = true;
        } else if b == b'.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    value[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Strict numeric conversion: surrounding whitespace is ignored, an empty
/// string is zero, and anything else must be a complete numeric literal
/// (decimal, exponent, `0x`/`0o`/`0b`, or `Infinity`).
pub fn strict_number(value: &CellValue) -> Option<f64> {
    let text = match value {
        CellValue::Number(n) if n.is_nan() => return None,
        CellValue::Number(n) => return Some(*n),
        CellValue::Text(text) => text.trim(),
    };
    if text.is_empty() {
        return Some(0.0);
    }
    match text {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
        }
    }
    let literal = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !literal {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Permissive date reading used for periods and date validation.
///
/// Numbers are epoch milliseconds. Text accepts RFC 3339 timestamps, ISO and
/// slash separated dates (month-first, falling back to day-first when the
/// month would be out of range), and spelled-out month names.
pub fn parse_loose_date(value: &CellValue) -> Result<NaiveDateTime> {
    match value {
        CellValue::Number(ms) if ms.is_finite() => DateTime::from_timestamp_millis(*ms as i64)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| anyhow!("Timestamp {ms} is out of range")),
        CellValue::Number(ms) => Err(anyhow!("Failed to parse '{ms}' as date")),
        CellValue::Text(text) => parse_date_text(text.trim()),
    }
}

fn parse_date_text(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%d-%m-%Y",
        "%d %B %Y",
        "%d %b %Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%b %d %Y",
    ];

    if value.is_empty() {
        return Err(anyhow!("Failed to parse empty value as date"));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed.and_hms_opt(0, 0, 0).unwrap_or_default());
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}
