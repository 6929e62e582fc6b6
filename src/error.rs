use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// No file, no header row, or no columns could be read.
    #[error("No input data: {0}")]
    InputMissing(String),
    #[error("Template '{0}' not found")]
    TemplateNotFound(String),
    /// A mapping referenced unknown columns or omitted required fields.
    #[error("Invalid mapping: {0}")]
    MappingInvalid(String),
    #[error("Invalid pattern '{pattern}' for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
