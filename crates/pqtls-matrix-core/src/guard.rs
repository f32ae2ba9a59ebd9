//! Consistency guard: the certificate's algorithms must match the configured build.
//!
//! The generated headers enforce this at compile time with
//! `#if defined(KEMTLS_CERT_ROOT_SIG_<sig>) && defined(KEMTLS_CERT_KEM_<kem>)` and an
//! `#error` branch. [`ConsistencyGuard`] evaluates the same condition at render time so
//! a mismatch is reported before any compiler runs, and so it can be unit-tested.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithm::{
    AlgorithmId, AlgorithmSelection, KemAlgorithm, SelectionField, SignatureAlgorithm,
};
use crate::certificate::CertAlgorithms;
use crate::error::{MatrixError, Result};

pub const SIG_SYMBOL_PREFIX: &str = "KEMTLS_CERT_ROOT_SIG_";
pub const KEM_SYMBOL_PREFIX: &str = "KEMTLS_CERT_KEM_";
pub const KEX_SYMBOL_PREFIX: &str = "KEMTLS_EPH_KEX_";

/// Signature/KEM pairs for which root certificates are provisioned.
pub const SUPPORTED_PAIRINGS: &[(SignatureAlgorithm, KemAlgorithm)] = &[
    (SignatureAlgorithm::Dilithium2, KemAlgorithm::Kyber512),
    (SignatureAlgorithm::Dilithium2, KemAlgorithm::LightSaber),
    (SignatureAlgorithm::Dilithium2, KemAlgorithm::NtruHps2048509),
    (SignatureAlgorithm::Falcon512, KemAlgorithm::Kyber512),
    (SignatureAlgorithm::Falcon512, KemAlgorithm::LightSaber),
    (SignatureAlgorithm::Falcon512, KemAlgorithm::NtruHps2048509),
    (SignatureAlgorithm::RainbowIClassic, KemAlgorithm::Kyber512),
    (SignatureAlgorithm::RainbowIClassic, KemAlgorithm::LightSaber),
    (SignatureAlgorithm::RainbowIClassic, KemAlgorithm::NtruHps2048509),
];

/// wolfSSL key-exchange group used for the ephemeral handshake KEM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KexGroup {
    #[serde(rename = "PQ_KYBER512")]
    Kyber512,
    #[serde(rename = "PQ_LIGHTSABER")]
    LightSaber,
    #[serde(rename = "PQ_NTRUHPS2048509")]
    NtruHps2048509,
}

impl KexGroup {
    pub const ALL: [Self; 3] = [Self::Kyber512, Self::LightSaber, Self::NtruHps2048509];

    /// The `KEX_GROUP` constant name.
    pub fn constant(&self) -> &'static str {
        match self {
            Self::Kyber512 => "PQ_KYBER512",
            Self::LightSaber => "PQ_LIGHTSABER",
            Self::NtruHps2048509 => "PQ_NTRUHPS2048509",
        }
    }

    pub fn algorithm(&self) -> KemAlgorithm {
        match self {
            Self::Kyber512 => KemAlgorithm::Kyber512,
            Self::LightSaber => KemAlgorithm::LightSaber,
            Self::NtruHps2048509 => KemAlgorithm::NtruHps2048509,
        }
    }
}

impl fmt::Display for KexGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constant())
    }
}

/// Map an ephemeral key-exchange identifier to its group constant.
pub fn kex_group(id: &AlgorithmId) -> Result<KexGroup> {
    KexGroup::ALL
        .into_iter()
        .find(|g| g.algorithm().as_str() == id.as_str())
        .ok_or_else(|| MatrixError::UnsupportedAlgorithm {
            kind: "ephemeral key-exchange",
            id: id.to_string(),
        })
}

/// True iff the selection's signature/KEM pair is in [`SUPPORTED_PAIRINGS`].
pub fn is_consistent(selection: &AlgorithmSelection) -> bool {
    let sig = SignatureAlgorithm::from_id(&selection.signature_alg);
    let kem = KemAlgorithm::from_id(&selection.cert_kem_alg);
    match (sig, kem) {
        (Some(sig), Some(kem)) => SUPPORTED_PAIRINGS.contains(&(sig, kem)),
        _ => false,
    }
}

pub fn sig_symbol(id: &AlgorithmId) -> String {
    format!("{SIG_SYMBOL_PREFIX}{id}")
}

pub fn kem_symbol(id: &AlgorithmId) -> String {
    format!("{KEM_SYMBOL_PREFIX}{id}")
}

pub fn kex_symbol(id: &AlgorithmId) -> String {
    format!("{KEX_SYMBOL_PREFIX}{id}")
}

/// Preprocessor symbols a render defines, keyed by the selection field they come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGuardSet {
    symbols: BTreeMap<SelectionField, String>,
}

impl FeatureGuardSet {
    pub fn for_selection(selection: &AlgorithmSelection) -> Self {
        let symbols = BTreeMap::from([
            (SelectionField::Signature, sig_symbol(&selection.signature_alg)),
            (SelectionField::CertKem, kem_symbol(&selection.cert_kem_alg)),
            (
                SelectionField::EphemeralKex,
                kex_symbol(&selection.ephemeral_kex_alg),
            ),
        ]);
        Self { symbols }
    }

    pub fn symbol(&self, field: SelectionField) -> Option<&str> {
        self.symbols.get(&field).map(String::as_str)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.values().any(|s| s == symbol)
    }

    /// Symbols in field order (signature, certificate KEM, ephemeral KEX).
    pub fn defines(&self) -> impl Iterator<Item = &str> {
        self.symbols.values().map(String::as_str)
    }
}

/// The symbol pair the certificate's guard expression requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredSymbols {
    pub sig_symbol: String,
    pub kem_symbol: String,
}

impl RequiredSymbols {
    /// From the certificate's own algorithms when known, otherwise from the selection.
    pub fn for_render(selection: &AlgorithmSelection, cert: Option<&CertAlgorithms>) -> Self {
        let (sig, kem) = match cert {
            Some(algs) => (&algs.signature, &algs.kem),
            None => (&selection.signature_alg, &selection.cert_kem_alg),
        };
        Self {
            sig_symbol: sig_symbol(sig),
            kem_symbol: kem_symbol(kem),
        }
    }

    /// The `#if` condition as emitted into the header.
    pub fn expression(&self) -> String {
        format!(
            "defined({}) && defined({})",
            self.sig_symbol, self.kem_symbol
        )
    }
}

/// Why a render was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The selected signature/KEM pair is not in [`SUPPORTED_PAIRINGS`].
    UnsupportedPairing,
    /// The required symbols are not among those the selection defines.
    MissingSymbols(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub required: RequiredSymbols,
    pub reason: RejectReason,
}

impl Rejection {
    pub fn to_error(&self) -> MatrixError {
        MatrixError::ConsistencyRejected {
            sig_symbol: self.required.sig_symbol.clone(),
            kem_symbol: self.required.kem_symbol.clone(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectReason::UnsupportedPairing => write!(
                f,
                "unsupported signature/KEM pairing for {}",
                self.required.expression()
            ),
            RejectReason::MissingSymbols(missing) => {
                write!(f, "{} not defined by the configuration", missing.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardState {
    #[default]
    Unvalidated,
    Valid,
    Rejected(Rejection),
}

impl GuardState {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// `Unvalidated -> {Valid, Rejected}`; `Rejected` is terminal.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyGuard {
    state: GuardState,
}

impl ConsistencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// Evaluate the guard for one render.
    pub fn check(
        &mut self,
        selection: &AlgorithmSelection,
        guards: &FeatureGuardSet,
        required: &RequiredSymbols,
    ) -> &GuardState {
        if matches!(self.state, GuardState::Rejected(_)) {
            return &self.state;
        }

        let reason = if !is_consistent(selection) {
            Some(RejectReason::UnsupportedPairing)
        } else {
            let missing: Vec<String> = [&required.sig_symbol, &required.kem_symbol]
                .into_iter()
                .filter(|s| !guards.contains(s))
                .cloned()
                .collect();
            (!missing.is_empty()).then_some(RejectReason::MissingSymbols(missing))
        };

        self.state = match reason {
            None => GuardState::Valid,
            Some(reason) => {
                let rejection = Rejection {
                    required: required.clone(),
                    reason,
                };
                tracing::warn!("consistency guard rejected {selection}: {rejection}");
                GuardState::Rejected(rejection)
            }
        };
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(sig: &str, kem: &str, kex: &str) -> AlgorithmSelection {
        AlgorithmSelection::new(sig, kem, kex).unwrap()
    }

    fn cert_algs(sig: &str, kem: &str) -> CertAlgorithms {
        CertAlgorithms {
            signature: AlgorithmId::new(sig).unwrap(),
            kem: AlgorithmId::new(kem).unwrap(),
        }
    }

    #[test]
    fn test_kex_group_table() {
        let id = |s: &str| AlgorithmId::new(s).unwrap();
        assert_eq!(kex_group(&id("kyber512")).unwrap(), KexGroup::Kyber512);
        assert_eq!(kex_group(&id("lightsaber")).unwrap().constant(), "PQ_LIGHTSABER");
        assert_eq!(
            kex_group(&id("ntruhps2048509")).unwrap().constant(),
            "PQ_NTRUHPS2048509"
        );
    }

    #[test]
    fn test_kex_group_rejects_unknown() {
        let err = kex_group(&AlgorithmId::new("mceliece").unwrap()).unwrap_err();
        match err {
            MatrixError::UnsupportedAlgorithm { id, .. } => assert_eq!(id, "mceliece"),
            other => panic!("unexpected error: {other}"),
        }
        // A signature scheme is not a key exchange.
        assert!(kex_group(&AlgorithmId::new("dilithium2").unwrap()).is_err());
    }

    #[test]
    fn test_is_consistent_matches_pairing_table() {
        let sigs = ["dilithium2", "falcon512", "rainbowIclassic", "sphincs", "kyber512"];
        let kems = ["kyber512", "lightsaber", "ntruhps2048509", "mceliece", "falcon512"];
        for sig in sigs {
            for kem in kems {
                let selection = sel(sig, kem, "kyber512");
                let expected = SUPPORTED_PAIRINGS
                    .iter()
                    .any(|(s, k)| s.as_str() == sig && k.as_str() == kem);
                assert_eq!(is_consistent(&selection), expected, "{sig}/{kem}");
            }
        }
    }

    #[test]
    fn test_feature_guard_symbols() {
        let guards = FeatureGuardSet::for_selection(&sel("dilithium2", "kyber512", "lightsaber"));
        assert_eq!(
            guards.symbol(SelectionField::Signature),
            Some("KEMTLS_CERT_ROOT_SIG_dilithium2")
        );
        assert_eq!(
            guards.symbol(SelectionField::CertKem),
            Some("KEMTLS_CERT_KEM_kyber512")
        );
        assert_eq!(
            guards.defines().collect::<Vec<_>>(),
            vec![
                "KEMTLS_CERT_ROOT_SIG_dilithium2",
                "KEMTLS_CERT_KEM_kyber512",
                "KEMTLS_EPH_KEX_lightsaber"
            ]
        );
    }

    #[test]
    fn test_guard_valid_for_matching_certificate() {
        let selection = sel("falcon512", "ntruhps2048509", "kyber512");
        let guards = FeatureGuardSet::for_selection(&selection);
        let required =
            RequiredSymbols::for_render(&selection, Some(&cert_algs("falcon512", "ntruhps2048509")));

        let mut guard = ConsistencyGuard::new();
        assert_eq!(guard.state(), &GuardState::Unvalidated);
        assert!(guard.check(&selection, &guards, &required).is_valid());
    }

    #[test]
    fn test_guard_rejects_certificate_mismatch() {
        let selection = sel("dilithium2", "kyber512", "kyber512");
        let guards = FeatureGuardSet::for_selection(&selection);
        let required =
            RequiredSymbols::for_render(&selection, Some(&cert_algs("falcon512", "kyber512")));

        let mut guard = ConsistencyGuard::new();
        match guard.check(&selection, &guards, &required) {
            GuardState::Rejected(rejection) => {
                assert_eq!(
                    rejection.reason,
                    RejectReason::MissingSymbols(vec!["KEMTLS_CERT_ROOT_SIG_falcon512".into()])
                );
                assert!(matches!(
                    rejection.to_error(),
                    MatrixError::ConsistencyRejected { ref sig_symbol, .. }
                        if sig_symbol == "KEMTLS_CERT_ROOT_SIG_falcon512"
                ));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_guard_rejects_unsupported_pairing() {
        let selection = sel("sphincs", "kyber512", "kyber512");
        let guards = FeatureGuardSet::for_selection(&selection);
        let required = RequiredSymbols::for_render(&selection, None);

        let mut guard = ConsistencyGuard::new();
        assert!(matches!(
            guard.check(&selection, &guards, &required),
            GuardState::Rejected(Rejection {
                reason: RejectReason::UnsupportedPairing,
                ..
            })
        ));
    }

    #[test]
    fn test_rejection_is_terminal() {
        let bad = sel("dilithium2", "kyber512", "kyber512");
        let mut guard = ConsistencyGuard::new();
        guard.check(
            &bad,
            &FeatureGuardSet::for_selection(&bad),
            &RequiredSymbols::for_render(&bad, Some(&cert_algs("falcon512", "kyber512"))),
        );
        let rejected = guard.state().clone();

        let good = sel("falcon512", "kyber512", "kyber512");
        let state = guard.check(
            &good,
            &FeatureGuardSet::for_selection(&good),
            &RequiredSymbols::for_render(&good, None),
        );
        assert_eq!(state, &rejected);
    }

    #[test]
    fn test_required_expression() {
        let selection = sel("dilithium2", "kyber512", "kyber512");
        let required = RequiredSymbols::for_render(&selection, None);
        assert_eq!(
            required.expression(),
            "defined(KEMTLS_CERT_ROOT_SIG_dilithium2) && defined(KEMTLS_CERT_KEM_kyber512)"
        );
    }
}
