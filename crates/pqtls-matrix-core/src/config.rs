//! Configuration file (`pqtls-matrix.config.json`).
//!
//! The config names where certificates are read from, where headers are written, and
//! which algorithms span the experiment matrix.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::algorithm::{AlgorithmId, KemAlgorithm, SignatureAlgorithm};
use crate::error::{MatrixError, Result};
use crate::renderer::ArtifactLayout;

pub const CONFIG_FILE: &str = "pqtls-matrix.config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Directory holding `<sig>_<kem>_<NNNN>_ca.crt` files.
    pub certificate_dir: PathBuf,
    /// Root directory for rendered headers.
    pub output_dir: PathBuf,
    /// Optional directory of `*.h` templates overriding the built-ins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    #[serde(default)]
    pub layout: ArtifactLayout,
    /// Certificate testcase number (the `NNNN` in the file name).
    pub testcase: u32,
    pub signature_algorithms: Vec<AlgorithmId>,
    pub kem_algorithms: Vec<AlgorithmId>,
    pub kex_algorithms: Vec<AlgorithmId>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            certificate_dir: PathBuf::from("certs"),
            output_dir: PathBuf::from("out"),
            template_dir: None,
            layout: ArtifactLayout::Split,
            testcase: 1,
            signature_algorithms: ids(SignatureAlgorithm::ALL.map(|a| a.as_str())),
            kem_algorithms: ids(KemAlgorithm::ALL.map(|a| a.as_str())),
            kex_algorithms: ids(KemAlgorithm::ALL.map(|a| a.as_str())),
        }
    }
}

fn ids(names: impl IntoIterator<Item = &'static str>) -> Vec<AlgorithmId> {
    names
        .into_iter()
        .filter_map(|n| AlgorithmId::new(n).ok())
        .collect()
}

impl MatrixConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| MatrixError::ConfigNotFound {
                path: path.to_path_buf(),
                source: e,
            })?;
        serde_json::from_str(&contents).map_err(|e| MatrixError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load `path` if it exists, otherwise fall back to [`MatrixConfig::default`].
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("{} not found, using default config", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| MatrixError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the config's relative paths against `base` (the config file's directory).
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.certificate_dir = resolve(self.certificate_dir);
        self.output_dir = resolve(self.output_dir);
        self.template_dir = self.template_dir.map(resolve);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spans_full_enumerations() {
        let config = MatrixConfig::default();
        assert_eq!(config.signature_algorithms.len(), 3);
        assert_eq!(config.kem_algorithms.len(), 3);
        assert_eq!(config.kex_algorithms[0].as_str(), "kyber512");
        assert_eq!(config.layout, ArtifactLayout::Split);
        assert_eq!(config.testcase, 1);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = MatrixConfig::default();
        config.layout = ArtifactLayout::Combined;
        config.template_dir = Some(PathBuf::from("templates"));
        config.save(&path).unwrap();

        let loaded = MatrixConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert!(matches!(
            MatrixConfig::load(&path),
            Err(MatrixError::ConfigNotFound { .. })
        ));
        assert_eq!(
            MatrixConfig::load_or_default(&path).unwrap(),
            MatrixConfig::default()
        );

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            MatrixConfig::load(&path),
            Err(MatrixError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_invalid_identifier_in_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let json = serde_json::json!({
            "certificate_dir": "certs",
            "output_dir": "out",
            "testcase": 1,
            "signature_algorithms": ["dilithium-2"],
            "kem_algorithms": [],
            "kex_algorithms": []
        });
        std::fs::write(&path, json.to_string()).unwrap();
        assert!(matches!(
            MatrixConfig::load(&path),
            Err(MatrixError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_resolve_paths() {
        let config = MatrixConfig::default().resolve_paths(Path::new("/work"));
        assert_eq!(config.certificate_dir, PathBuf::from("/work/certs"));
        assert_eq!(config.output_dir, PathBuf::from("/work/out"));
        assert!(config.template_dir.is_none());
    }
}
