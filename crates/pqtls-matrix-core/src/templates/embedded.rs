//! Compile-time embedded header templates.
//!
//! Each constant loads a template file from `templates/headers/` via [`include_str!`].
//! The paths are relative to this source file
//! (`crates/pqtls-matrix-core/src/templates/embedded.rs`).
//!
//! Do NOT rename or move template files without updating the `include_str!` path here.

pub const KEMTLS_EXPERIMENTS: &str =
    include_str!("../../../../templates/headers/kemtls_experiments.h");
pub const KEMTLS_CA: &str = include_str!("../../../../templates/headers/kemtls_ca.h");
pub const KEMTLS_EXPERIMENTS_WITH_CA: &str =
    include_str!("../../../../templates/headers/kemtls_experiments_with_ca.h");

/// A template shipped with the crate.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinTemplate {
    /// Name used with [`super::store::TemplateStore::load_template`].
    pub name: &'static str,
    /// File name the rendered header is written to.
    pub file_name: &'static str,
    pub source: &'static str,
}

pub const BUILTIN: &[BuiltinTemplate] = &[
    BuiltinTemplate {
        name: "kemtls_experiments",
        file_name: "kemtlsexperiments.h",
        source: KEMTLS_EXPERIMENTS,
    },
    BuiltinTemplate {
        name: "kemtls_ca",
        file_name: "kemtls_ca.h",
        source: KEMTLS_CA,
    },
    BuiltinTemplate {
        name: "kemtls_experiments_with_ca",
        file_name: "kemtlsexperiments.h",
        source: KEMTLS_EXPERIMENTS_WITH_CA,
    },
];
