use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{io_utils, mapping::FieldMapping, report::Report, summary::Summary};

pub const MISSING_CELL: &str = "-";

pub fn table_headers(mapping: &FieldMapping) -> Vec<String> {
    mapping.targets().map(str::to_string).collect()
}

pub fn table_rows(report: &Report) -> Vec<Vec<String>> {
    let headers = table_headers(&report.mapping);
    report
        .data
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|field| {
                    row.get(field)
                        .map(|value| value.as_display())
                        .unwrap_or_else(|| MISSING_CELL.to_string())
                })
                .collect()
        })
        .collect()
}

/// `(label, value)` lines describing a summary, skipping absent members.
pub fn summary_rows(summary: &Summary) -> Vec<Vec<String>> {
    let mut rows = vec![
        vec!["records".to_string(), summary.count.to_string()],
        vec!["total".to_string(), format_amount(summary.total)],
    ];
    if let Some(average) = summary.average {
        rows.push(vec!["average".to_string(), format_amount(average)]);
    }
    if let Some(period) = &summary.period {
        rows.push(vec!["period".to_string(), period.clone()]);
    }
    if let Some(categories) = &summary.categories {
        for (label, count) in categories {
            rows.push(vec![format!("category: {label}"), count.to_string()]);
        }
    }
    rows
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Writes the report's mapped rows as CSV, with `_rowIndex` first.
pub fn write_csv(report: &Report, path: Option<&Path>, delimiter: u8) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    let mut headers = vec![crate::rows::ROW_INDEX_KEY.to_string()];
    headers.extend(table_headers(&report.mapping));
    writer.write_record(&headers).context("Writing CSV header")?;
    for (row, cells) in report.data.iter().zip(table_rows(report)) {
        let mut record = Vec::with_capacity(cells.len() + 1);
        record.push(row.row_index.to_string());
        record.extend(cells);
        writer
            .write_record(&record)
            .with_context(|| format!("Writing row {}", row.row_index))?;
    }
    writer.flush().context("Flushing CSV output")?;
    if let Some(path) = path {
        info!("Exported {} row(s) to {:?}", report.data.len(), path);
    }
    Ok(())
}

/// Writes the full report as pretty JSON; `None` or `-` goes to stdout.
pub fn write_json(report: &Report, path: Option<&Path>) -> Result<()> {
    io_utils::save_json(path, report)?;
    if let Some(path) = path.filter(|p| !io_utils::is_dash(p)) {
        info!("Report {} written to {:?}", report.report_id, path);
    }
    Ok(())
}
