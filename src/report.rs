//! Assembles the report artifact handed to export renderers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auto_map::keyword_data_type,
    data::Row,
    error::ReportError,
    inference::DataType,
    mapping::FieldMapping,
    rows::{MappedRow, apply_mapping},
    summary::{Summary, SummaryOptions, generate_financial_summary},
    template::Template,
    validate::{MappingCheck, validate_mapping, validate_required_fields},
    verify::{ValidationError, validate_data},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub summary: Summary,
    pub data: Vec<MappedRow>,
    pub mapping: FieldMapping,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportMeta {
    pub fn new(report_id: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            report_id: report_id.into(),
            generated_at,
        }
    }

    /// Random v4 id stamped with the current time.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string(), Utc::now())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportBuilder<'a> {
    template: Option<&'a Template>,
    summary_options: SummaryOptions,
    data_types: BTreeMap<String, DataType>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforces the template's required fields at the mapping gate.
    pub fn template(mut self, template: &'a Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn summary_options(mut self, options: SummaryOptions) -> Self {
        self.summary_options = options;
        self
    }

    /// Declared types per target field for cell validation. Fields without
    /// an entry get a type guessed from their name.
    pub fn data_types(mut self, data_types: BTreeMap<String, DataType>) -> Self {
        self.data_types = data_types;
        self
    }

    pub fn check(&self, mapping: &FieldMapping, columns: &[String]) -> MappingCheck {
        let check = validate_mapping(mapping, columns);
        if !check.valid {
            return check;
        }
        match self.template {
            Some(template) => validate_required_fields(mapping, &template.required_fields),
            None => check,
        }
    }

    pub fn build(
        &self,
        columns: &[String],
        rows: &[Row],
        mapping: &FieldMapping,
        meta: ReportMeta,
    ) -> Result<Report, ReportError> {
        if columns.is_empty() {
            return Err(ReportError::InputMissing("no columns found".to_string()));
        }
        let check = self.check(mapping, columns);
        if !check.valid {
            let message = check
                .error
                .unwrap_or_else(|| "mapping rejected".to_string());
            return Err(ReportError::MappingInvalid(message));
        }

        let data = apply_mapping(rows, mapping);
        let summary = generate_financial_summary(&data, mapping, &self.summary_options);
        let column_mappings = mapping.to_column_mappings(|target| {
            self.data_types
                .get(target)
                .copied()
                .unwrap_or_else(|| keyword_data_type(target))
        });
        let errors = validate_data(rows, &column_mappings);
        if !errors.is_empty() {
            warn!("{} cell(s) failed validation", errors.len());
        }
        debug!("Report {} covers {} row(s)", meta.report_id, data.len());

        Ok(Report {
            report_id: meta.report_id,
            template_id: self.template.map(|t| t.id.clone()),
            summary,
            data,
            mapping: mapping.clone(),
            errors,
            generated_at: meta.generated_at,
        })
    }
}
