pub mod auto_map;
pub mod catalog;
pub mod cli;
pub mod data;
pub mod error;
pub mod export;
pub mod inference;
pub mod io_utils;
pub mod mapping;
pub mod matcher;
pub mod patterns;
pub mod report;
pub mod rows;
pub mod summary;
pub mod table;
pub mod template;
pub mod validate;
pub mod verify;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};
use serde::Serialize;

use crate::{
    auto_map::{AutoMapping, MappingStrategy, PassThroughStrategy, StrictStrategy, suggest_mapping},
    catalog::Catalog,
    cli::{Cli, Commands, InputArgs, Strategy},
    inference::{DataType, detect_column_types},
    io_utils::Dataset,
    mapping::FieldMapping,
    report::{ReportBuilder, ReportMeta},
    summary::SummaryOptions,
    template::Template,
    validate::{mapping_stats, validate_columns},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("report_mapper", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let catalog = Catalog::load_or_builtin(cli.catalog.as_deref())?;
    match cli.command {
        Commands::Templates => handle_templates(&catalog),
        Commands::Detect(args) => handle_detect(&args),
        Commands::Map(args) => handle_map(&catalog, &args),
        Commands::Suggest(args) => handle_suggest(&catalog, &args),
        Commands::Check(args) => handle_check(&catalog, &args),
        Commands::Report(args) => handle_report(&catalog, &args),
    }
}

fn load_input(args: &InputArgs) -> Result<Dataset> {
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(&args.input, args.delimiter))
    );
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    io_utils::load_dataset(&args.input, args.delimiter, encoding, args.limit)
}

fn handle_templates(catalog: &Catalog) -> Result<()> {
    let headers = ["id", "name", "type", "required", "optional"]
        .map(String::from)
        .to_vec();
    let rows = catalog
        .templates
        .templates()
        .iter()
        .map(|template| {
            vec![
                template.id.clone(),
                template.name.clone(),
                template.kind.as_str().to_string(),
                template.required_fields.join(", "),
                template.optional_fields.join(", "),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

#[derive(Debug, Serialize)]
struct DetectedColumn<'a> {
    column: &'a str,
    #[serde(rename = "type")]
    data_type: DataType,
}

fn handle_detect(args: &cli::DetectArgs) -> Result<()> {
    let dataset = load_input(&args.input)?;
    let types = detect_column_types(&dataset.rows);
    let detected = dataset
        .columns
        .iter()
        .filter(|column| !column.is_empty())
        .map(|column| DetectedColumn {
            column: column.as_str(),
            data_type: types.get(column).copied().unwrap_or(DataType::Unknown),
        })
        .collect::<Vec<_>>();
    info!(
        "Inferred types for {} column(s) over {} row(s)",
        detected.len(),
        dataset.rows.len()
    );
    if args.json {
        return io_utils::save_json(None, &detected);
    }
    let headers = vec!["column".to_string(), "type".to_string()];
    let rows = detected
        .iter()
        .map(|d| vec![d.column.to_string(), d.data_type.to_string()])
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

fn handle_map(catalog: &Catalog, args: &cli::MapArgs) -> Result<()> {
    let dataset = load_input(&args.input)?;
    let template = args
        .template
        .as_deref()
        .map(|id| catalog.templates.require_template(id))
        .transpose()?;
    let result = run_strategy(catalog, template, args.strategy, &dataset.columns);

    print_auto_mapping(&result);
    if let Some(template) = template {
        let stats = mapping_stats(&result.mapping, template);
        println!(
            "\nTemplate '{}': {}/{} required, {}/{} optional ({}% complete)",
            template.id,
            stats.mapped_required,
            stats.total_required,
            stats.mapped_optional,
            stats.total_optional,
            stats.completion_percentage
        );
    }
    if let Some(path) = &args.output {
        io_utils::save_json(Some(path), &result.mapping)
            .with_context(|| format!("Writing mapping to {path:?}"))?;
        info!("Mapping for {} field(s) written to {:?}", result.mapping.len(), path);
    }
    Ok(())
}

fn run_strategy(
    catalog: &Catalog,
    template: Option<&Template>,
    strategy: Strategy,
    columns: &[String],
) -> AutoMapping {
    let (mapper, fields): (Box<dyn MappingStrategy + '_>, Vec<String>) = match strategy {
        Strategy::Strict => (
            Box::new(StrictStrategy::new(&catalog.patterns)),
            match template {
                Some(template) => template.all_fields().map(str::to_string).collect(),
                None => catalog.patterns.field_names().map(str::to_string).collect(),
            },
        ),
        Strategy::PassThrough => (
            Box::new(PassThroughStrategy::new(&catalog.patterns)),
            template
                .map(|t| t.required_fields.clone())
                .unwrap_or_default(),
        ),
    };
    debug!(
        "Running {} mapping over {} column(s) and {} field(s)",
        mapper.name(),
        columns.len(),
        fields.len()
    );
    mapper.map(columns, &fields)
}

fn print_auto_mapping(result: &AutoMapping) {
    let headers = ["field", "column", "type", "score"]
        .map(String::from)
        .to_vec();
    let rows = result
        .mapping
        .iter()
        .map(|(field, column)| {
            vec![
                field.to_string(),
                column.to_string(),
                result
                    .data_types
                    .get(field)
                    .map_or_else(String::new, |t| t.to_string()),
                result
                    .confidence
                    .get(field)
                    .map_or_else(String::new, |s| s.to_string()),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    if !result.unmatched.is_empty() {
        println!("\nUnmatched columns: {}", result.unmatched.join(", "));
    }
}

fn handle_suggest(catalog: &Catalog, args: &cli::SuggestArgs) -> Result<()> {
    let dataset = load_input(&args.input)?;
    let current = match &args.mapping {
        Some(path) => io_utils::load_json::<FieldMapping>(path)
            .with_context(|| format!("Loading mapping from {path:?}"))?,
        None => FieldMapping::new(),
    };
    let suggestions = suggest_mapping(&args.field, &dataset.columns, &current, &catalog.patterns);
    if suggestions.is_empty() {
        warn!("No column matches field '{}'", args.field);
        return Ok(());
    }
    let headers = vec!["column".to_string(), "score".to_string()];
    let rows = suggestions
        .iter()
        .map(|s| vec![s.column.clone(), s.score.to_string()])
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    Ok(())
}

fn handle_check(catalog: &Catalog, args: &cli::CheckArgs) -> Result<()> {
    let dataset = load_input(&args.input)?;
    let template = catalog.templates.require_template(&args.template)?;
    let mapping = io_utils::load_json::<FieldMapping>(&args.mapping)
        .with_context(|| format!("Loading mapping from {:?}", args.mapping))?;

    let sources = mapping
        .sources()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    let columns = validate_columns(&dataset.columns, &sources);
    if !columns.valid {
        warn!(
            "Columns missing from '{}': {}",
            args.input.input.display(),
            columns.missing.join(", ")
        );
    }

    let check = ReportBuilder::new()
        .template(template)
        .check(&mapping, &dataset.columns);
    let stats = mapping_stats(&mapping, template);
    println!(
        "Required fields mapped: {}/{}",
        stats.mapped_required, stats.total_required
    );
    println!(
        "Optional fields mapped: {}/{}",
        stats.mapped_optional, stats.total_optional
    );
    println!("Completion: {}%", stats.completion_percentage);

    if !check.valid {
        bail!(
            "Mapping is invalid: {}",
            check.error.unwrap_or_else(|| "unknown reason".to_string())
        );
    }
    println!("Mapping is valid for template '{}'", template.id);
    Ok(())
}

fn handle_report(catalog: &Catalog, args: &cli::ReportArgs) -> Result<()> {
    let dataset = load_input(&args.input)?;
    let template = catalog.templates.require_template(&args.template)?;

    let mut builder = ReportBuilder::new()
        .template(template)
        .summary_options(SummaryOptions {
            amount_field: args.amount_field.clone(),
            date_field: args.date_field.clone(),
            category_field: args.category_field.clone(),
        });
    let mapping = match &args.mapping {
        Some(path) => io_utils::load_json::<FieldMapping>(path)
            .with_context(|| format!("Loading mapping from {path:?}"))?,
        None => {
            let result = run_strategy(catalog, Some(template), Strategy::Strict, &dataset.columns);
            info!(
                "Auto-mapped {} field(s); {} column(s) unmatched",
                result.mapping.len(),
                result.unmatched.len()
            );
            builder = builder.data_types(result.data_types);
            result.mapping
        }
    };

    let report = builder
        .build(&dataset.columns, &dataset.rows, &mapping, ReportMeta::generate())
        .with_context(|| format!("Building '{}' report", template.id))?;
    info!(
        "Report {} built from {} row(s) with {} validation error(s)",
        report.report_id,
        report.data.len(),
        report.errors.len()
    );

    match &args.output {
        Some(path) => export::write_json(&report, Some(path))
            .with_context(|| format!("Writing report to {path:?}"))?,
        None => {
            let headers = vec!["summary".to_string(), "value".to_string()];
            table::print_table(&headers, &export::summary_rows(&report.summary));
            println!();
            table::print_table(
                &export::table_headers(&report.mapping),
                &export::table_rows(&report),
            );
        }
    }
    if let Some(path) = &args.csv {
        let delimiter = args.output_delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
        export::write_csv(&report, Some(path), delimiter)?;
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
