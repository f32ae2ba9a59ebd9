//! Manifest of a matrix run, saved as `<output_dir>/manifest.json`.
//!
//! Records a SHA-256 per generated header so reruns can be diffed for reproducibility.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::algorithm::AlgorithmSelection;
use crate::error::{MatrixError, Result};
use crate::guard::KexGroup;
use crate::renderer::RenderedArtifact;

const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Path relative to the output root.
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub selection: AlgorithmSelection,
    pub kex_group: KexGroup,
    pub buildable: bool,
    pub files: Vec<ManifestFile>,
}

impl ManifestEntry {
    /// Describe the artifacts of one selection, written under `subdir`.
    ///
    /// `artifacts` must be non-empty and share one selection.
    pub fn new(subdir: &Path, artifacts: &[RenderedArtifact]) -> Option<Self> {
        let first = artifacts.first()?;
        Some(Self {
            selection: first.selection().clone(),
            kex_group: first.kex_group(),
            buildable: artifacts.iter().all(RenderedArtifact::is_buildable),
            files: artifacts
                .iter()
                .map(|a| ManifestFile {
                    path: subdir.join(a.file_name()),
                    sha256: sha256_hex(a.text().as_bytes()),
                    bytes: a.text().len() as u64,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn buildable_count(&self) -> usize {
        self.entries.iter().filter(|e| e.buildable).count()
    }
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Save the manifest to `<output_dir>/manifest.json`.
pub fn save(manifest: &Manifest, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(manifest).map_err(|e| MatrixError::ConfigParse {
        path: path.clone(),
        source: e,
    })?;
    std::fs::write(&path, json)?;
    Ok(())
}

/// Load the manifest from `<output_dir>/manifest.json`.
pub fn load(output_dir: &Path) -> Result<Manifest> {
    let path = output_dir.join(MANIFEST_FILE);
    let contents = std::fs::read_to_string(&path).map_err(|e| MatrixError::ConfigNotFound {
        path: path.clone(),
        source: e,
    })?;
    let manifest: Manifest =
        serde_json::from_str(&contents).map_err(|e| MatrixError::ConfigParse {
            path: path.clone(),
            source: e,
        })?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::CertificateBlob;
    use crate::renderer::{render_headers, ArtifactLayout};
    use crate::templates::store::TemplateStore;

    fn entry() -> ManifestEntry {
        let store = TemplateStore::builtin().unwrap();
        let selection = AlgorithmSelection::new("falcon512", "kyber512", "lightsaber").unwrap();
        let cert = CertificateBlob::from_bytes(vec![0xaa; 40]);
        let artifacts = render_headers(&store, ArtifactLayout::Split, &selection, &cert).unwrap();
        ManifestEntry::new(Path::new("lightsaber/falcon512_kyber512"), &artifacts).unwrap()
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_entry_describes_artifacts() {
        let entry = entry();
        assert!(entry.buildable);
        assert_eq!(entry.kex_group, KexGroup::LightSaber);
        assert_eq!(entry.files.len(), 2);
        assert_eq!(
            entry.files[1].path,
            PathBuf::from("lightsaber/falcon512_kyber512/kemtls_ca.h")
        );
        assert_eq!(entry.files[0].sha256.len(), 64);
    }

    #[test]
    fn test_entry_requires_artifacts() {
        assert!(ManifestEntry::new(Path::new("x"), &[]).is_none());
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest {
            entries: vec![entry()],
        };
        save(&manifest, dir.path()).unwrap();
        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.buildable_count(), 1);
    }

    #[test]
    fn test_manifest_load_nonexistent() {
        let result = load(Path::new("/tmp/nonexistent_pqtls_matrix_manifest"));
        assert!(matches!(result, Err(MatrixError::ConfigNotFound { .. })));
    }
}
