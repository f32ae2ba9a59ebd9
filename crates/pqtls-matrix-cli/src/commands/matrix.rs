use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use pqtls_matrix_core::algorithm::AlgorithmSelection;
use pqtls_matrix_core::certificate::CertificateBlob;
use pqtls_matrix_core::emit;
use pqtls_matrix_core::error::MatrixError;
use pqtls_matrix_core::manifest::{self, Manifest, ManifestEntry};
use pqtls_matrix_core::matrix::{certificate_path, output_subdir, ExperimentMatrix};
use pqtls_matrix_core::renderer::{render_headers, ArtifactLayout};
use pqtls_matrix_core::templates::store::TemplateStore;

use crate::output;

enum Outcome {
    Rendered(ManifestEntry),
    MissingCertificate(PathBuf),
}

/// Render every selection of the configured matrix.
///
/// Each selection is an independent blocking job; at most `jobs` run at once. Results
/// are put back into matrix order before the manifest is written, so reruns with the
/// same inputs produce the same manifest.
pub async fn run(config_path: &Path, jobs: usize) -> Result<()> {
    output::print_header("pqtls-matrix matrix");

    let config = super::load_config(config_path)?;
    let store = Arc::new(super::template_store(&config)?);
    let matrix = ExperimentMatrix::from_config(&config);
    if matrix.is_empty() {
        anyhow::bail!("the configured matrix is empty; check the algorithm lists in the config");
    }

    output::print_key_value("Selections", &matrix.len().to_string());
    output::print_key_value("Layout", config.layout.as_str());
    output::print_key_value("Certificates", &config.certificate_dir.display().to_string());
    output::print_key_value("Output", &config.output_dir.display().to_string());

    output::print_step(1, 2, "Rendering headers...");
    let progress = ProgressBar::new(matrix.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = JoinSet::new();
    for (index, selection) in matrix.selections().into_iter().enumerate() {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let store = Arc::clone(&store);
        let layout = config.layout;
        let cert_path = certificate_path(&config.certificate_dir, &selection, config.testcase);
        let subdir = output_subdir(&selection);
        let output_dir = config.output_dir.clone();

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let outcome =
                render_selection(&store, layout, &selection, &cert_path, &output_dir, &subdir);
            (index, selection, outcome)
        });
    }

    let mut results = Vec::with_capacity(matrix.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, selection, outcome) = joined?;
        progress.set_message(selection.to_string());
        progress.inc(1);
        results.push((index, selection, outcome));
    }
    progress.finish_and_clear();
    results.sort_by_key(|(index, _, _)| *index);

    let mut manifest = Manifest::default();
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for (_, selection, outcome) in results {
        match outcome {
            Ok(Outcome::Rendered(entry)) => {
                if !entry.buildable {
                    output::print_warning(&format!("{selection}: certificate/configuration mismatch"));
                }
                manifest.entries.push(entry);
            }
            Ok(Outcome::MissingCertificate(path)) => {
                skipped += 1;
                output::print_warning(&format!("{selection}: no certificate at {}", path.display()));
            }
            Err(e) => {
                failed += 1;
                output::print_error(&format!("{selection}: {e}"));
            }
        }
    }

    output::print_step(2, 2, "Writing manifest...");
    manifest::save(&manifest, &config.output_dir)?;

    output::print_key_value("Rendered", &manifest.entries.len().to_string());
    output::print_key_value("Buildable", &manifest.buildable_count().to_string());
    output::print_key_value("Skipped", &skipped.to_string());

    if failed > 0 {
        anyhow::bail!("{failed} selection(s) failed to render");
    }
    output::print_success("Matrix complete");

    Ok(())
}

fn render_selection(
    store: &TemplateStore,
    layout: ArtifactLayout,
    selection: &AlgorithmSelection,
    cert_path: &Path,
    output_dir: &Path,
    subdir: &Path,
) -> std::result::Result<Outcome, MatrixError> {
    let cert = match CertificateBlob::load(cert_path) {
        Ok(cert) => cert,
        Err(MatrixError::CertificateNotFound(path)) => {
            return Ok(Outcome::MissingCertificate(path))
        }
        Err(e) => return Err(e),
    };
    let artifacts = render_headers(store, layout, selection, &cert)?;
    emit::write_artifacts(&output_dir.join(subdir), &artifacts)?;
    ManifestEntry::new(subdir, &artifacts)
        .map(Outcome::Rendered)
        .ok_or_else(|| {
            MatrixError::Other(anyhow::anyhow!(
                "layout '{}' rendered no headers",
                layout.as_str()
            ))
        })
}
