//! The full experiment matrix: every signature × certificate KEM × ephemeral KEX.

use std::path::{Path, PathBuf};

use crate::algorithm::{AlgorithmId, AlgorithmSelection};
use crate::certificate::certificate_file_name;
use crate::config::MatrixConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentMatrix {
    pub signature_algorithms: Vec<AlgorithmId>,
    pub kem_algorithms: Vec<AlgorithmId>,
    pub kex_algorithms: Vec<AlgorithmId>,
}

impl ExperimentMatrix {
    pub fn from_config(config: &MatrixConfig) -> Self {
        Self {
            signature_algorithms: config.signature_algorithms.clone(),
            kem_algorithms: config.kem_algorithms.clone(),
            kex_algorithms: config.kex_algorithms.clone(),
        }
    }

    /// All selections, ordered by ephemeral KEX, then signature, then KEM.
    pub fn selections(&self) -> Vec<AlgorithmSelection> {
        let mut out = Vec::with_capacity(self.len());
        for kex in &self.kex_algorithms {
            for sig in &self.signature_algorithms {
                for kem in &self.kem_algorithms {
                    out.push(AlgorithmSelection {
                        signature_alg: sig.clone(),
                        cert_kem_alg: kem.clone(),
                        ephemeral_kex_alg: kex.clone(),
                    });
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.signature_algorithms.len() * self.kem_algorithms.len() * self.kex_algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where the root certificate for `selection` is provisioned.
pub fn certificate_path(cert_dir: &Path, selection: &AlgorithmSelection, testcase: u32) -> PathBuf {
    cert_dir.join(certificate_file_name(
        &selection.signature_alg,
        &selection.cert_kem_alg,
        testcase,
    ))
}

/// `<eph>/<sig>_<kem>`, relative to the output root.
pub fn output_subdir(selection: &AlgorithmSelection) -> PathBuf {
    PathBuf::from(selection.ephemeral_kex_alg.as_str()).join(format!(
        "{}_{}",
        selection.signature_alg, selection.cert_kem_alg
    ))
}
