//! Read-only registry of parsed header templates.
//!
//! All templates are parsed when the store is built, so a malformed template fails
//! up front instead of midway through a matrix run. After construction the store is
//! never mutated and can be shared across render threads behind an `Arc`.
//!
//! ## Usage
//!
//! ```ignore
//! use pqtls_matrix_core::templates::store::TemplateStore;
//!
//! let store = TemplateStore::builtin()?;
//! let doc = store.load_template("kemtls_ca")?;
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MatrixError, Result};
use crate::templates::document::TemplateDocument;
use crate::templates::embedded;

const TEMPLATE_EXTENSION: &str = "h";

#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: BTreeMap<String, TemplateDocument>,
}

impl TemplateStore {
    /// The templates embedded in the crate.
    pub fn builtin() -> Result<Self> {
        let mut templates = BTreeMap::new();
        for t in embedded::BUILTIN {
            let doc = TemplateDocument::parse(t.name, t.file_name, t.source)?;
            templates.insert(t.name.to_string(), doc);
        }
        Ok(Self { templates })
    }

    /// The built-in templates, overlaid with every `*.h` file in `dir`.
    ///
    /// The file stem is the template name; a file named like a built-in template
    /// replaces it but keeps the built-in output file name.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut store = Self::builtin()?;

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let file_name = embedded::BUILTIN
                .iter()
                .find(|t| t.name == name)
                .map(|t| t.file_name.to_string())
                .unwrap_or_else(|| format!("{name}.{TEMPLATE_EXTENSION}"));
            let source = std::fs::read_to_string(&path)?;
            let doc = TemplateDocument::parse(name, &file_name, &source)?;
            tracing::debug!("loaded template '{name}' from {}", path.display());
            store.templates.insert(name.to_string(), doc);
        }

        Ok(store)
    }

    /// Look up a template by name.
    pub fn load_template(&self, name: &str) -> Result<TemplateDocument> {
        self.get(name).cloned()
    }

    /// Borrowing variant of [`Self::load_template`].
    pub fn get(&self, name: &str) -> Result<&TemplateDocument> {
        self.templates
            .get(name)
            .ok_or_else(|| MatrixError::TemplateNotFound {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn documents(&self) -> impl Iterator<Item = &TemplateDocument> {
        self.templates.values()
    }
}
