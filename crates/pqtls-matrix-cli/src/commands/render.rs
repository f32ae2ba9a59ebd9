use std::path::{Path, PathBuf};

use anyhow::Result;

use pqtls_matrix_core::algorithm::AlgorithmSelection;
use pqtls_matrix_core::certificate::CertificateBlob;
use pqtls_matrix_core::emit;
use pqtls_matrix_core::matrix::certificate_path;
use pqtls_matrix_core::renderer::{render_headers, ArtifactLayout};

use crate::output;
use crate::prompt;

/// Flags for `pqtls-matrix render`; anything left `None` comes from the config.
pub struct RenderRequest {
    pub sig: Option<String>,
    pub kem: Option<String>,
    pub kex: Option<String>,
    pub cert: Option<PathBuf>,
    pub testcase: Option<u32>,
    pub layout: Option<ArtifactLayout>,
    pub out: Option<PathBuf>,
    pub allow_mismatch: bool,
}

/// Render and write the headers for one algorithm selection.
///
/// Headers are written even when the consistency guard rejects the pairing, so the
/// mismatch can be inspected; the command then fails unless `allow_mismatch` is set.
pub async fn run(config_path: &Path, request: RenderRequest) -> Result<()> {
    output::print_header("pqtls-matrix render");

    let config = super::load_config(config_path)?;

    let sig = prompt::algorithm_or_prompt(
        request.sig,
        "root signature algorithm",
        &config.signature_algorithms,
    )?;
    let kem = prompt::algorithm_or_prompt(
        request.kem,
        "certificate KEM algorithm",
        &config.kem_algorithms,
    )?;
    let kex = prompt::algorithm_or_prompt(
        request.kex,
        "ephemeral key-exchange algorithm",
        &config.kex_algorithms,
    )?;
    let selection = AlgorithmSelection::new(&sig, &kem, &kex)?;
    let layout = request.layout.unwrap_or(config.layout);
    let testcase = request.testcase.unwrap_or(config.testcase);

    output::print_key_value("Signature", selection.signature_alg.as_str());
    output::print_key_value("Certificate KEM", selection.cert_kem_alg.as_str());
    output::print_key_value("Ephemeral KEX", selection.ephemeral_kex_alg.as_str());
    output::print_key_value("Layout", layout.as_str());

    output::print_step(1, 3, "Loading certificate");
    let cert_path = request
        .cert
        .unwrap_or_else(|| certificate_path(&config.certificate_dir, &selection, testcase));
    let cert = CertificateBlob::load(&cert_path)?;
    output::print_key_value(
        "Certificate",
        &format!("{} ({} bytes)", cert_path.display(), cert.declared_len()),
    );

    output::print_step(2, 3, "Rendering headers");
    let store = super::template_store(&config)?;
    let artifacts = render_headers(&store, layout, &selection, &cert)?;
    if let Some(first) = artifacts.first() {
        output::print_key_value("KEX_GROUP", first.kex_group().constant());
    }

    output::print_step(3, 3, "Writing headers");
    let out_dir = request.out.unwrap_or(config.output_dir);
    let paths = emit::write_artifacts(&out_dir, &artifacts)?;
    for (path, artifact) in paths.iter().zip(&artifacts) {
        output::print_written(path, artifact);
    }

    let rejected = artifacts.iter().find(|a| !a.is_buildable());
    match rejected {
        None => {
            output::print_success(&format!("Headers for {selection} written"));
        }
        Some(artifact) => {
            output::print_guard_state(artifact.guard());
            if request.allow_mismatch {
                output::print_warning("Headers written; compilation will stop at the #error guard");
            } else {
                artifact.ensure_buildable()?;
            }
        }
    }

    Ok(())
}
