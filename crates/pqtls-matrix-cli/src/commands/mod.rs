//! CLI command implementations for pqtls-matrix.
//!
//! Each module corresponds to a subcommand (`pqtls-matrix <command>`).

pub mod check;
pub mod init;
pub mod matrix;
pub mod render;
pub mod templates;

use std::path::Path;

use anyhow::Result;

use pqtls_matrix_core::config::MatrixConfig;
use pqtls_matrix_core::templates::store::TemplateStore;

/// Load the config at `config_path` (defaults if absent), with paths resolved
/// against the config file's directory.
pub fn load_config(config_path: &Path) -> Result<MatrixConfig> {
    let base = config_path.parent().unwrap_or(Path::new("."));
    tracing::debug!("loading config from {}", config_path.display());
    Ok(MatrixConfig::load_or_default(config_path)?.resolve_paths(base))
}

/// Built-in templates, overlaid with the config's template directory if set.
pub fn template_store(config: &MatrixConfig) -> Result<TemplateStore> {
    let store = match &config.template_dir {
        Some(dir) => TemplateStore::from_dir(dir)?,
        None => TemplateStore::builtin()?,
    };
    Ok(store)
}
