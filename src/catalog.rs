//! Static configuration shared by every mapping run.
//!
//! A [`Catalog`] bundles the template registry and the compiled pattern
//! table. It is built once (from the built-in tables or a YAML file) and
//! handed to the engine by reference.
//!
//! ```yaml
//! templates:
//!   - id: payroll
//!     name: Payroll Report
//!     type: payroll
//!     required_fields: [name, amount]
//!     optional_fields: [department]
//! patterns:
//!   - field: name
//!     regex: ["^(employee[ _])?name$", "nama"]
//! ```
//!
//! Sections left out of the file keep their built-in contents.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    patterns::{PatternSpec, PatternTable},
    template::{Template, TemplateRegistry},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<Template>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<PatternSpec>>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub templates: TemplateRegistry,
    pub patterns: PatternTable,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            templates: TemplateRegistry::builtin(),
            patterns: PatternTable::builtin(),
        }
    }

    pub fn from_file(file: CatalogFile) -> Result<Self> {
        let templates = match file.templates {
            Some(templates) => TemplateRegistry::new(templates),
            None => TemplateRegistry::builtin(),
        };
        let patterns = match file.patterns {
            Some(specs) => PatternTable::from_specs(&specs)?,
            None => PatternTable::builtin(),
        };
        debug!(
            "Catalog holds {} template(s) and {} pattern famil(ies)",
            templates.templates().len(),
            patterns.len()
        );
        Ok(Self {
            templates,
            patterns,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening catalog file {path:?}"))?;
        let reader = BufReader::new(file);
        let parsed: CatalogFile =
            serde_yaml::from_reader(reader).context("Parsing catalog YAML")?;
        Self::from_file(parsed).with_context(|| format!("Loading catalog from {path:?}"))
    }

    /// Loads `path` when given, otherwise returns the built-in catalog.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn to_file(&self) -> CatalogFile {
        CatalogFile {
            templates: Some(self.templates.templates().to_vec()),
            patterns: Some(self.patterns.to_specs()),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
