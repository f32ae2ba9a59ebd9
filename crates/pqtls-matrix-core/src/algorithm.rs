//! Algorithm identifiers and the three-axis selection that fixes one matrix point.
//!
//! Identifiers are kept as validated strings ([`AlgorithmId`]) so that a selection can
//! name algorithms the tables do not know yet; the closed enumerations
//! ([`SignatureAlgorithm`], [`KemAlgorithm`]) are consulted by the operations that need
//! them and reject unknown identifiers there.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MatrixError, Result};

/// An algorithm name usable as the suffix of a preprocessor symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlgorithmId(String);

impl AlgorithmId {
    /// Validate `s` as `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        let mut chars = s.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if valid {
            Ok(Self(s))
        } else {
            Err(MatrixError::InvalidIdentifier(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AlgorithmId {
    type Error = MatrixError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<AlgorithmId> for String {
    fn from(id: AlgorithmId) -> Self {
        id.0
    }
}

impl FromStr for AlgorithmId {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Root certificate signature schemes with provisioned certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignatureAlgorithm {
    Dilithium2,
    Falcon512,
    RainbowIClassic,
}

impl SignatureAlgorithm {
    pub const ALL: [Self; 3] = [Self::Dilithium2, Self::Falcon512, Self::RainbowIClassic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dilithium2 => "dilithium2",
            Self::Falcon512 => "falcon512",
            Self::RainbowIClassic => "rainbowIclassic",
        }
    }

    /// Look up an identifier; `None` if it is not a known signature scheme.
    pub fn from_id(id: &AlgorithmId) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.as_str() == id.as_str())
    }
}

/// KEMs usable both for the certificate key and the ephemeral key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KemAlgorithm {
    Kyber512,
    LightSaber,
    NtruHps2048509,
}

impl KemAlgorithm {
    pub const ALL: [Self; 3] = [Self::Kyber512, Self::LightSaber, Self::NtruHps2048509];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kyber512 => "kyber512",
            Self::LightSaber => "lightsaber",
            Self::NtruHps2048509 => "ntruhps2048509",
        }
    }

    /// Look up an identifier; `None` if it is not a known KEM.
    pub fn from_id(id: &AlgorithmId) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.as_str() == id.as_str())
    }
}

/// The three axes of the experiment matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectionField {
    Signature,
    CertKem,
    EphemeralKex,
}

/// One point in the algorithm matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlgorithmSelection {
    pub signature_alg: AlgorithmId,
    pub cert_kem_alg: AlgorithmId,
    pub ephemeral_kex_alg: AlgorithmId,
}

impl AlgorithmSelection {
    /// Build a selection, validating each identifier.
    pub fn new(signature_alg: &str, cert_kem_alg: &str, ephemeral_kex_alg: &str) -> Result<Self> {
        Ok(Self {
            signature_alg: AlgorithmId::new(signature_alg)?,
            cert_kem_alg: AlgorithmId::new(cert_kem_alg)?,
            ephemeral_kex_alg: AlgorithmId::new(ephemeral_kex_alg)?,
        })
    }

    pub fn field(&self, field: SelectionField) -> &AlgorithmId {
        match field {
            SelectionField::Signature => &self.signature_alg,
            SelectionField::CertKem => &self.cert_kem_alg,
            SelectionField::EphemeralKex => &self.ephemeral_kex_alg,
        }
    }
}

impl fmt::Display for AlgorithmSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sig={} kem={} kex={}",
            self.signature_alg, self.cert_kem_alg, self.ephemeral_kex_alg
        )
    }
}
