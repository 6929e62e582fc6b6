//! File-parsing collaborator: turns uploads into columns and rows.
//!
//! The engine itself never touches the filesystem. This module resolves
//! delimiters and encodings, strips a leading byte-order mark, applies the
//! caller's row cap, and reads or writes JSON interchange files.
//!
//! - **Delimiter resolution**: `.tsv` → tab, everything else → comma, with
//!   manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{DeserializeOwned, MapAccess, Visitor},
};

use crate::{
    data::{CellValue, Row},
    error::ReportError,
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Columns and rows read from one upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    Ok(if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    })
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Trimmed header names with any byte-order mark removed from the first.
pub fn clean_headers(headers: Vec<String>) -> Vec<String> {
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let header = if idx == 0 {
                header.trim_start_matches(BYTE_ORDER_MARK).to_string()
            } else {
                header
            };
            header.trim().to_string()
        })
        .collect()
}

/// Reads a delimited file into a [`Dataset`], keeping at most `limit` rows.
///
/// Cells are kept as text. Short records simply omit the trailing columns
/// from their row; a file without a header row is [`ReportError::InputMissing`].
pub fn read_csv_dataset<R: Read>(
    reader: R,
    delimiter: u8,
    encoding: &'static Encoding,
    limit: Option<usize>,
) -> Result<Dataset> {
    let mut reader = open_csv_reader(reader, delimiter);
    let raw_headers = reader.byte_headers().context("Reading header row")?.clone();
    let columns = clean_headers(decode_record(&raw_headers, encoding)?);
    if columns.iter().all(|c| c.is_empty()) {
        return Err(ReportError::InputMissing("no header row found".to_string()).into());
    }

    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        if let Some(limit) = limit
            && row_idx >= limit
        {
            debug!("Row limit {limit} reached");
            break;
        }
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        let row = columns
            .iter()
            .zip(decoded)
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), CellValue::Text(value)))
            .collect::<Row>();
        rows.push(row);
    }
    Ok(Dataset { columns, rows })
}

/// One JSON object with its keys in file order.
struct JsonRecord(Vec<(String, CellValue)>);

impl<'de> Deserialize<'de> for JsonRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = JsonRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of cell values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut cells = Vec::new();
                while let Some(entry) = access.next_entry::<String, CellValue>()? {
                    cells.push(entry);
                }
                Ok(JsonRecord(cells))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Reads a JSON array of objects. Columns are collected in first-seen order
/// across the file, following each object's key order.
pub fn read_json_dataset<R: Read>(reader: R, limit: Option<usize>) -> Result<Dataset> {
    let mut records: Vec<JsonRecord> =
        serde_json::from_reader(reader).context("Parsing JSON rows")?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());
    for JsonRecord(cells) in records {
        for (key, _) in &cells {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        rows.push(cells.into_iter().collect::<Row>());
    }
    if columns.is_empty() {
        return Err(ReportError::InputMissing("no columns found in JSON rows".to_string()).into());
    }
    Ok(Dataset { columns, rows })
}

/// Loads `path` as JSON when it has a `.json` extension, otherwise as CSV/TSV.
pub fn load_dataset(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
    limit: Option<usize>,
) -> Result<Dataset> {
    let input = open_input(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let dataset = if is_json {
        read_json_dataset(input, limit)
    } else {
        let delimiter = resolve_input_delimiter(path, delimiter);
        read_csv_dataset(input, delimiter, encoding, limit)
    }
    .with_context(|| format!("Loading data from {path:?}"))?;
    debug!(
        "Loaded {} column(s) and {} row(s) from {:?}",
        dataset.columns.len(),
        dataset.rows.len(),
        path
    );
    Ok(dataset)
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Opening JSON file {path:?}"))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("Parsing JSON {path:?}"))
}

pub fn save_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    match path {
        Some(p) if !is_dash(p) => {
            let file = File::create(p).with_context(|| format!("Creating JSON file {p:?}"))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value).context("Writing JSON")?;
            writer.flush()?;
        }
        _ => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value).context("Writing JSON")?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
