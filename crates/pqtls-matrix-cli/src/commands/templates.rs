use std::path::Path;

use anyhow::Result;

use pqtls_matrix_core::templates::document::list_placeholders;

use crate::output;

/// List the templates available under the current config and their placeholders.
pub async fn run(config_path: &Path) -> Result<()> {
    output::print_header("pqtls-matrix templates");

    let config = super::load_config(config_path)?;
    let store = super::template_store(&config)?;

    for doc in store.documents() {
        let placeholders: Vec<String> = list_placeholders(doc)
            .iter()
            .map(|p| p.delimited())
            .collect();
        println!();
        output::print_key_value("Template", doc.name());
        output::print_key_value("Writes", doc.file_name());
        output::print_key_value("Placeholders", &placeholders.join(" "));
    }
    println!();

    Ok(())
}
