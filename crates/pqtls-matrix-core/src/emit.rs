//! Writing rendered headers to disk.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::renderer::RenderedArtifact;

/// Write `artifact` to `<dir>/<file_name>`, creating `dir` if needed.
///
/// An existing header is overwritten; a warning is logged first since the target is
/// usually a header inside a firmware tree that someone may have edited.
pub fn write_artifact(dir: &Path, artifact: &RenderedArtifact) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(artifact.file_name());
    if path.is_file() {
        tracing::warn!("{} already exists, overwriting", path.display());
    }
    std::fs::write(&path, artifact.text())?;
    tracing::info!(
        "wrote {} ({} bytes, {})",
        path.display(),
        artifact.text().len(),
        artifact.selection()
    );
    Ok(path)
}

/// Write every artifact of one selection into `dir`.
pub fn write_artifacts(dir: &Path, artifacts: &[RenderedArtifact]) -> Result<Vec<PathBuf>> {
    artifacts.iter().map(|a| write_artifact(dir, a)).collect()
}
