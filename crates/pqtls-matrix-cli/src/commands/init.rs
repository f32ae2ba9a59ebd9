use std::path::Path;

use anyhow::Result;

use pqtls_matrix_core::config::{MatrixConfig, CONFIG_FILE};

use crate::output;

/// Set up a directory for header generation.
///
/// Writes a default `pqtls-matrix.config.json` spanning every known algorithm and
/// creates the certificate and output directories it points at. Refuses to overwrite
/// an existing config.
pub async fn run(dir: &Path) -> Result<()> {
    output::print_header(&format!("pqtls-matrix init: {}", dir.display()));

    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    output::print_step(1, 2, "Writing configuration file");
    std::fs::create_dir_all(dir)?;
    let config = MatrixConfig::default();
    config.save(&config_path)?;

    output::print_step(2, 2, "Creating certificate and output directories");
    std::fs::create_dir_all(dir.join(&config.certificate_dir))?;
    std::fs::create_dir_all(dir.join(&config.output_dir))?;

    output::print_success(&format!("Initialized {}", config_path.display()));
    println!();
    println!("  Next steps:");
    println!(
        "    copy root certificates into {}/ as <sig>_<kem>_0001_ca.crt",
        config.certificate_dir.display()
    );
    println!("    pqtls-matrix render --sig dilithium2 --kem kyber512 --kex kyber512");
    println!("    pqtls-matrix matrix");
    println!();

    Ok(())
}
