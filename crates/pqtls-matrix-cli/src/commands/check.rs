use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use pqtls_matrix_core::algorithm::AlgorithmSelection;
use pqtls_matrix_core::certificate::{parse_certificate_file_name, CertAlgorithms};
use pqtls_matrix_core::guard::{
    is_consistent, kex_group, ConsistencyGuard, FeatureGuardSet, GuardState, RequiredSymbols,
};

use crate::output;

#[derive(Serialize)]
struct CheckReport {
    selection: AlgorithmSelection,
    certificate: Option<CertAlgorithms>,
    consistent: bool,
    kex_group: Option<String>,
    defines: Vec<String>,
    requires: RequiredSymbols,
    guard: GuardState,
}

/// Evaluate the consistency guard for a selection without rendering anything.
///
/// With `cert`, the certificate's issuing algorithms are read from its file name; the
/// file itself does not have to exist.
pub async fn run(sig: &str, kem: &str, kex: &str, cert: Option<&Path>, json: bool) -> Result<()> {
    let selection = AlgorithmSelection::new(sig, kem, kex)?;
    let certificate = match cert {
        Some(path) => {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let (algorithms, _) = parse_certificate_file_name(name).ok_or_else(|| {
                anyhow::anyhow!("{name} does not follow <sig>_<kem>_<NNNN>_ca.crt")
            })?;
            Some(algorithms)
        }
        None => None,
    };

    let guards = FeatureGuardSet::for_selection(&selection);
    let requires = RequiredSymbols::for_render(&selection, certificate.as_ref());
    let mut guard = ConsistencyGuard::new();
    let state = guard.check(&selection, &guards, &requires).clone();

    let report = CheckReport {
        consistent: is_consistent(&selection),
        kex_group: kex_group(&selection.ephemeral_kex_alg)
            .ok()
            .map(|g| g.constant().to_string()),
        defines: guards.defines().map(str::to_string).collect(),
        selection,
        certificate,
        requires,
        guard: state,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::print_header("pqtls-matrix check");
    output::print_key_value("Selection", &report.selection.to_string());
    output::print_key_value("Supported pairing", &report.consistent.to_string());
    output::print_key_value(
        "KEX_GROUP",
        report.kex_group.as_deref().unwrap_or("unsupported"),
    );
    for symbol in &report.defines {
        output::print_key_value("Defines", symbol);
    }
    output::print_key_value("Requires", &report.requires.expression());
    output::print_guard_state(&report.guard);

    if report.guard.is_valid() {
        output::print_success("Certificate and configuration agree");
    } else {
        output::print_error("Headers for this selection would stop at the #error guard");
    }

    Ok(())
}
