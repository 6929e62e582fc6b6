//! Report templates: the target schemas that source columns are mapped onto.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ReportError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Financial,
    Attendance,
    Inventory,
    Custom(String),
}

impl TemplateKind {
    pub fn as_str(&self) -> &str {
        match self {
            TemplateKind::Financial => "financial",
            TemplateKind::Attendance => "attendance",
            TemplateKind::Inventory => "inventory",
            TemplateKind::Custom(name) => name.as_str(),
        }
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "financial" => TemplateKind::Financial,
            "attendance" => TemplateKind::Attendance,
            "inventory" => TemplateKind::Inventory,
            _ => TemplateKind::Custom(value.trim().to_string()),
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TemplateKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TemplateKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(TemplateKind::parse(&raw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    #[serde(alias = "required_fields")]
    pub required_fields: Vec<String>,
    #[serde(default, alias = "optional_fields")]
    pub optional_fields: Vec<String>,
}

impl Template {
    pub fn is_field_required(&self, field: &str) -> bool {
        self.required_fields.iter().any(|f| f == field)
    }

    /// Required fields first, then optional ones, each in declaration order.
    pub fn all_fields(&self) -> impl Iterator<Item = &str> {
        self.required_fields
            .iter()
            .chain(self.optional_fields.iter())
            .map(String::as_str)
    }
}

fn template(
    id: &str,
    name: &str,
    kind: TemplateKind,
    required: &[&str],
    optional: &[&str],
) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        required_fields: required.iter().map(|f| (*f).to_string()).collect(),
        optional_fields: optional.iter().map(|f| (*f).to_string()).collect(),
    }
}

/// Read-only lookup over the configured templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl TemplateRegistry {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            template(
                "financial",
                "Financial Report",
                TemplateKind::Financial,
                &["date", "amount", "category"],
                &["description", "reference", "notes"],
            ),
            template(
                "attendance",
                "Attendance Report",
                TemplateKind::Attendance,
                &["date", "name", "status"],
                &["check_in", "check_out", "department", "notes"],
            ),
            template(
                "inventory",
                "Inventory Report",
                TemplateKind::Inventory,
                &["item_name", "quantity", "unit_price"],
                &["sku", "category", "location", "notes"],
            ),
        ])
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn get_template_by_id(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn require_template(&self, id: &str) -> Result<&Template, ReportError> {
        self.get_template_by_id(id)
            .ok_or_else(|| ReportError::TemplateNotFound(id.to_string()))
    }

    /// Required fields of template `id`; empty when the template is unknown.
    pub fn get_required_fields(&self, id: &str) -> &[String] {
        self.get_template_by_id(id)
            .map(|t| t.required_fields.as_slice())
            .unwrap_or_default()
    }

    pub fn is_field_required(&self, id: &str, field: &str) -> bool {
        self.get_template_by_id(id)
            .is_some_and(|t| t.is_field_required(field))
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
