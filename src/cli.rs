use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Map spreadsheet columns onto report templates",
    long_about = None
)]
pub struct Cli {
    /// YAML catalog overriding the built-in templates and column patterns
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the available report templates
    Templates,
    /// Infer a data type for every column of an input file
    Detect(DetectArgs),
    /// Auto-map input columns onto template fields
    Map(MapArgs),
    /// Rank candidate columns for a single field
    Suggest(SuggestArgs),
    /// Validate a saved mapping against an input file and template
    Check(CheckArgs),
    /// Build a report from an input file
    Report(ReportArgs),
}

/// Options shared by every command that reads an input file.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV, TSV or JSON file (`-` reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Limit number of data rows read
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Restrict mapping to this template's fields
    #[arg(short = 't', long = "template")]
    pub template: Option<String>,
    /// Auto-mapping strategy
    #[arg(long, value_enum, default_value_t = Strategy::Strict)]
    pub strategy: Strategy,
    /// Write the resulting mapping as JSON
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Target field to rank columns for
    #[arg(short = 'f', long = "field")]
    pub field: String,
    /// Existing mapping whose source columns are excluded
    #[arg(short = 'm', long = "mapping")]
    pub mapping: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Mapping JSON file (`{"field": "column", ...}`)
    #[arg(short = 'm', long = "mapping")]
    pub mapping: PathBuf,
    /// Template whose required fields must be mapped
    #[arg(short = 't', long = "template")]
    pub template: String,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Template the report is built for
    #[arg(short = 't', long = "template")]
    pub template: String,
    /// Mapping JSON file; auto-mapped when omitted
    #[arg(short = 'm', long = "mapping")]
    pub mapping: Option<PathBuf>,
    /// Write the report as JSON (stdout when `-`)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Also export the mapped rows as CSV
    #[arg(long = "csv")]
    pub csv: Option<PathBuf>,
    /// Delimiter for the CSV export
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Amount field for the summary (discovered from field names otherwise)
    #[arg(long = "amount-field")]
    pub amount_field: Option<String>,
    /// Date field for the summary
    #[arg(long = "date-field")]
    pub date_field: Option<String>,
    /// Category field for the summary
    #[arg(long = "category-field")]
    pub category_field: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Pattern matching only; unmatched columns stay unmapped
    Strict,
    /// Required fields by best match, every other column kept as-is
    PassThrough,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
