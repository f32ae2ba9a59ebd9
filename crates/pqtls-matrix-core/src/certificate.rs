//! Root certificate blobs and their C byte-array rendering.
//!
//! Certificates are provisioned as files named `<sig>_<kem>_<NNNN>_ca.crt`, either raw
//! DER or PEM-armored. The file name is the only record of which algorithms the
//! certificate was issued with, so [`CertificateBlob::load`] keeps it as
//! [`CertAlgorithms`] for the consistency guard.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::algorithm::{AlgorithmId, KemAlgorithm, SignatureAlgorithm};
use crate::error::{MatrixError, Result};

/// Maximum width of a line of byte literals in a rendered header.
pub const MAX_LINE_WIDTH: usize = 80;

const CERT_FILE_SUFFIX: &str = "_ca.crt";
const PEM_BOUNDARY: &str = "-----";

/// Signature and KEM algorithms a certificate was actually issued with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertAlgorithms {
    pub signature: AlgorithmId,
    pub kem: AlgorithmId,
}

/// Raw root certificate bytes plus their declared length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBlob {
    bytes: Vec<u8>,
    declared_len: usize,
    algorithms: Option<CertAlgorithms>,
}

impl CertificateBlob {
    /// Wrap `bytes`, checking that `declared_len` matches the byte count exactly.
    pub fn new(bytes: Vec<u8>, declared_len: usize) -> Result<Self> {
        if bytes.len() != declared_len {
            return Err(MatrixError::LengthMismatch {
                declared: declared_len,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes,
            declared_len,
            algorithms: None,
        })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let declared_len = bytes.len();
        Self {
            bytes,
            declared_len,
            algorithms: None,
        }
    }

    /// Record which algorithms issued this certificate.
    pub fn with_algorithms(mut self, algorithms: CertAlgorithms) -> Self {
        self.algorithms = Some(algorithms);
        self
    }

    /// Load a DER or PEM certificate from disk.
    ///
    /// A file named `<sig>_<kem>_<NNNN>_ca.crt` gets the algorithms it names attached
    /// to the blob. A `_ca.crt` name that cannot be parsed is an error, since the guard
    /// would otherwise fall back to the configured algorithms unnoticed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MatrixError::CertificateNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        let bytes = if raw.starts_with(b"-----BEGIN") {
            decode_pem(&raw).map_err(|reason| MatrixError::CertificateDecode {
                path: path.to_path_buf(),
                reason,
            })?
        } else {
            raw
        };
        tracing::debug!("loaded certificate {} ({} bytes)", path.display(), bytes.len());

        let blob = Self::from_bytes(bytes);
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        if !file_name.ends_with(CERT_FILE_SUFFIX) {
            tracing::warn!(
                "{} is not named <sig>_<kem>_<NNNN>{CERT_FILE_SUFFIX}; \
                 checking it against the configured algorithms",
                path.display()
            );
            return Ok(blob);
        }
        match parse_certificate_file_name(file_name) {
            Some((algorithms, _)) => Ok(blob.with_algorithms(algorithms)),
            None => Err(MatrixError::CertificateDecode {
                path: path.to_path_buf(),
                reason: format!(
                    "cannot recover issuing algorithms from '{file_name}' \
                     (expected <sig>_<kem>_<NNNN>{CERT_FILE_SUFFIX})"
                ),
            }),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    pub fn algorithms(&self) -> Option<&CertAlgorithms> {
        self.algorithms.as_ref()
    }

    /// Re-check the length invariant.
    pub fn verify_length(&self) -> Result<()> {
        if self.bytes.len() != self.declared_len {
            return Err(MatrixError::LengthMismatch {
                declared: self.declared_len,
                actual: self.bytes.len(),
            });
        }
        Ok(())
    }

    /// The bytes as `0x..` literals, comma-separated and wrapped at [`MAX_LINE_WIDTH`].
    pub fn hex_literals(&self) -> String {
        hex_literals(&self.bytes)
    }
}

/// Render bytes as comma-separated `0x%02x` literals, greedily wrapped so no line
/// exceeds [`MAX_LINE_WIDTH`]. Wrapped lines keep their trailing comma.
pub fn hex_literals(bytes: &[u8]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for (i, b) in bytes.iter().enumerate() {
        let token = if i + 1 < bytes.len() {
            format!("0x{b:02x},")
        } else {
            format!("0x{b:02x}")
        };
        if !line.is_empty() && line.len() + 1 + token.len() > MAX_LINE_WIDTH {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}

/// Parse the comma-separated `0x..` literals produced by [`hex_literals`].
pub fn decode_hex_literals(text: &str) -> Option<Vec<u8>> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            let digits = token.strip_prefix("0x")?;
            u8::from_str_radix(digits, 16).ok()
        })
        .collect()
}

/// The certificate array and length recovered from a rendered header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedCertificate {
    pub bytes: Vec<u8>,
    pub declared_len: usize,
}

/// Find `ca_cert[] = { ... };` and `ca_cert_len = N;` in header text and decode them.
pub fn extract_embedded_certificate(header: &str) -> Option<EmbeddedCertificate> {
    let array_start = header.find("ca_cert[] = {")? + "ca_cert[] = {".len();
    let array_len = header[array_start..].find("};")?;
    let bytes = decode_hex_literals(&header[array_start..array_start + array_len])?;

    let len_start = header.find("ca_cert_len = ")? + "ca_cert_len = ".len();
    let len_end = header[len_start..].find(';')?;
    let declared_len = header[len_start..len_start + len_end].trim().parse().ok()?;

    Some(EmbeddedCertificate {
        bytes,
        declared_len,
    })
}

/// `<sig>_<kem>_<NNNN>_ca.crt`
pub fn certificate_file_name(signature: &AlgorithmId, kem: &AlgorithmId, testcase: u32) -> String {
    format!("{signature}_{kem}_{testcase:04}{CERT_FILE_SUFFIX}")
}

/// Reverse of [`certificate_file_name`].
///
/// The testcase is the last `_`-separated field and has at least four digits. When an
/// algorithm name itself contains `_`, the split is taken where the names match the
/// known signature and KEM tables; a split that stays ambiguous yields `None`.
pub fn parse_certificate_file_name(name: &str) -> Option<(CertAlgorithms, u32)> {
    let stem = name.strip_suffix(CERT_FILE_SUFFIX)?;
    let (pair, testcase) = stem.rsplit_once('_')?;
    if testcase.len() < 4 || !testcase.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let testcase: u32 = testcase.parse().ok()?;

    let mut candidates: Vec<CertAlgorithms> = pair
        .match_indices('_')
        .filter_map(|(at, _)| {
            Some(CertAlgorithms {
                signature: AlgorithmId::new(&pair[..at]).ok()?,
                kem: AlgorithmId::new(&pair[at + 1..]).ok()?,
            })
        })
        .collect();
    if candidates.len() == 1 {
        return candidates.pop().map(|algorithms| (algorithms, testcase));
    }

    let known = |c: &CertAlgorithms| {
        u8::from(SignatureAlgorithm::from_id(&c.signature).is_some())
            + u8::from(KemAlgorithm::from_id(&c.kem).is_some())
    };
    let best = candidates.iter().map(known).max().filter(|&score| score > 0)?;
    let mut matching = candidates.into_iter().filter(|c| known(c) == best);
    let algorithms = matching.next()?;
    if matching.next().is_some() {
        return None;
    }
    Some((algorithms, testcase))
}

fn decode_pem(raw: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let text = std::str::from_utf8(raw).map_err(|e| e.to_string())?;
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    match lines.next() {
        Some(l) if l.starts_with(PEM_BOUNDARY) => {}
        _ => return Err("missing PEM header line".into()),
    }
    let mut body = String::new();
    let mut terminated = false;
    for line in lines {
        if line.starts_with(PEM_BOUNDARY) {
            terminated = true;
            break;
        }
        body.push_str(line);
    }
    if !terminated {
        return Err("missing PEM footer line".into());
    }

    BASE64_STANDARD
        .decode(body.as_bytes())
        .map_err(|e| format!("invalid base64 body: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AlgorithmId {
        AlgorithmId::new(s).unwrap()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = CertificateBlob::new(vec![1, 2, 3], 4).unwrap_err();
        assert!(matches!(
            err,
            MatrixError::LengthMismatch {
                declared: 4,
                actual: 3
            }
        ));
        assert!(CertificateBlob::new(vec![1, 2, 3], 3).is_ok());
    }

    #[test]
    fn test_hex_literals_wrap_at_13_per_line() {
        let bytes: Vec<u8> = (0..30).collect();
        let text = hex_literals(&bytes);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].split(", ").count(), 13);
        assert!(lines[0].ends_with("0x0c,"));
        assert!(lines[1].starts_with("0x0d,"));
        assert_eq!(lines[2], "0x1a, 0x1b, 0x1c, 0x1d");
        assert!(lines.iter().all(|l| l.len() <= MAX_LINE_WIDTH));
    }

    #[test]
    fn test_hex_literals_edge_sizes() {
        assert_eq!(hex_literals(&[]), "");
        assert_eq!(hex_literals(&[0xab]), "0xab");
        assert_eq!(hex_literals(&[0x00, 0xff]), "0x00, 0xff");
    }

    #[test]
    fn test_decode_hex_literals_recovers_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_hex_literals(&hex_literals(&bytes)), Some(bytes));
        assert_eq!(decode_hex_literals("0x01, zz"), None);
    }

    #[test]
    fn test_file_name_convention() {
        let name = certificate_file_name(&id("dilithium2"), &id("kyber512"), 1);
        assert_eq!(name, "dilithium2_kyber512_0001_ca.crt");

        let (algs, testcase) = parse_certificate_file_name(&name).unwrap();
        assert_eq!(algs.signature.as_str(), "dilithium2");
        assert_eq!(algs.kem.as_str(), "kyber512");
        assert_eq!(testcase, 1);
    }

    #[test]
    fn test_parse_file_name_rejects_other_shapes() {
        assert!(parse_certificate_file_name("dilithium2_0001_ca.crt").is_none());
        assert!(parse_certificate_file_name("dilithium2_kyber512_1_ca.crt").is_none());
        assert!(parse_certificate_file_name("dilithium2_kyber512_0001.pem").is_none());
        assert!(parse_certificate_file_name("a_b_c_0001_ca.crt").is_none());
        assert!(parse_certificate_file_name("dilithium2_kyber512_00x1_ca.crt").is_none());
    }

    #[test]
    fn test_file_name_with_long_testcase() {
        let name = certificate_file_name(&id("falcon512"), &id("kyber512"), 12345);
        assert_eq!(name, "falcon512_kyber512_12345_ca.crt");

        let (algs, testcase) = parse_certificate_file_name(&name).unwrap();
        assert_eq!(algs.signature.as_str(), "falcon512");
        assert_eq!(algs.kem.as_str(), "kyber512");
        assert_eq!(testcase, 12345);
    }

    #[test]
    fn test_file_name_with_underscored_algorithm() {
        let name = certificate_file_name(&id("sphincs_shake_128f"), &id("kyber512"), 2);
        let (algs, testcase) = parse_certificate_file_name(&name).unwrap();
        assert_eq!(algs.signature.as_str(), "sphincs_shake_128f");
        assert_eq!(algs.kem.as_str(), "kyber512");
        assert_eq!(testcase, 2);

        let name = certificate_file_name(&id("dilithium2"), &id("ntru_hps_509"), 7);
        let (algs, _) = parse_certificate_file_name(&name).unwrap();
        assert_eq!(algs.signature.as_str(), "dilithium2");
        assert_eq!(algs.kem.as_str(), "ntru_hps_509");
    }

    #[test]
    fn test_load_unparseable_convention_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["dilithium2_kyber512_1_ca.crt", "a_b_c_0001_ca.crt"] {
            let path = dir.path().join(name);
            std::fs::write(&path, [0x30, 0x82]).unwrap();
            match CertificateBlob::load(&path) {
                Err(MatrixError::CertificateDecode { path: p, reason }) => {
                    assert_eq!(p, path);
                    assert!(reason.contains(name));
                }
                other => panic!("unexpected result for {name}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_der_attaches_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("falcon512_lightsaber_0003_ca.crt");
        std::fs::write(&path, [0x30, 0x82, 0x01, 0x00]).unwrap();

        let blob = CertificateBlob::load(&path).unwrap();
        assert_eq!(blob.bytes(), &[0x30, 0x82, 0x01, 0x00]);
        assert_eq!(blob.declared_len(), 4);
        let algs = blob.algorithms().unwrap();
        assert_eq!(algs.signature.as_str(), "falcon512");
        assert_eq!(algs.kem.as_str(), "lightsaber");
    }

    #[test]
    fn test_load_pem_decodes_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("root.crt");
        let der: Vec<u8> = (0u8..100).collect();
        let b64 = BASE64_STANDARD.encode(&der);
        let (first, second) = b64.split_at(64);
        let pem = format!(
            "-----BEGIN CERTIFICATE-----\n{first}\n{second}\n-----END CERTIFICATE-----\n"
        );
        std::fs::write(&path, pem).unwrap();

        let blob = CertificateBlob::load(&path).unwrap();
        assert_eq!(blob.bytes(), der.as_slice());
        assert!(blob.algorithms().is_none());
    }

    #[test]
    fn test_load_pem_without_footer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.crt");
        std::fs::write(&path, "-----BEGIN CERTIFICATE-----\nAAAA\n").unwrap();
        assert!(matches!(
            CertificateBlob::load(&path),
            Err(MatrixError::CertificateDecode { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = CertificateBlob::load(Path::new("/tmp/nonexistent_pqtls_matrix_ca.crt"));
        assert!(matches!(result, Err(MatrixError::CertificateNotFound(_))));
    }

    #[test]
    fn test_extract_embedded_certificate() {
        let header = format!(
            "const char ca_cert[] = {{\n{}\n}};\nint ca_cert_len = 3;\n",
            hex_literals(&[1, 2, 3])
        );
        let embedded = extract_embedded_certificate(&header).unwrap();
        assert_eq!(embedded.bytes, vec![1, 2, 3]);
        assert_eq!(embedded.declared_len, 3);
        assert!(extract_embedded_certificate("#define X").is_none());
    }
}
