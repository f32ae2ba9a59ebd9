//! Placeholder substitution for experiment headers.
//!
//! Rendering is a pure function of `(document, selection, certificate)`: no I/O, no
//! shared state, byte-identical output for identical inputs. Writing the result to
//! disk is left to [`crate::emit`].
//!
//! Every render goes through the same steps:
//! 1. resolve the ephemeral key exchange to its [`KexGroup`] (fails on unknown ids)
//! 2. re-check the certificate length
//! 3. run the [`ConsistencyGuard`]; its state decides the emitted `#if` condition
//! 4. bind every placeholder the document lists, failing on the first missing one
//! 5. substitute through Handlebars and attach the guard state to the artifact

use std::collections::{BTreeMap, BTreeSet};

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::algorithm::AlgorithmSelection;
use crate::certificate::CertificateBlob;
use crate::error::{MatrixError, Result};
use crate::guard::{
    kex_group, ConsistencyGuard, FeatureGuardSet, GuardState, KexGroup, RequiredSymbols,
};
use crate::templates::document::{Placeholder, TemplateDocument};
use crate::templates::store::TemplateStore;

/// Condition emitted in place of the symbol check when the guard rejects a render.
pub const REJECTED_GUARD_EXPR: &str = "0";

/// A rendered header. Immutable; owned by whoever requested the render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    template: String,
    file_name: String,
    text: String,
    selection: AlgorithmSelection,
    kex_group: KexGroup,
    guard: GuardState,
}

impl RenderedArtifact {
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selection(&self) -> &AlgorithmSelection {
        &self.selection
    }

    /// The `KEX_GROUP` the header selects.
    pub fn kex_group(&self) -> KexGroup {
        self.kex_group
    }

    pub fn guard(&self) -> &GuardState {
        &self.guard
    }

    pub fn is_buildable(&self) -> bool {
        self.guard.is_valid()
    }

    /// Fail with [`MatrixError::ConsistencyRejected`] if the guard rejected this render.
    pub fn ensure_buildable(&self) -> Result<&Self> {
        match &self.guard {
            GuardState::Rejected(rejection) => Err(rejection.to_error()),
            _ => Ok(self),
        }
    }
}

/// How the configuration and certificate are split across header files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactLayout {
    /// `kemtlsexperiments.h` with the defines, `kemtls_ca.h` with the certificate.
    #[default]
    Split,
    /// A single `kemtlsexperiments.h` holding both.
    Combined,
}

impl ArtifactLayout {
    /// Template names rendered for this layout, in output order.
    pub fn templates(&self) -> &'static [&'static str] {
        match self {
            Self::Split => &["kemtls_experiments", "kemtls_ca"],
            Self::Combined => &["kemtls_experiments_with_ca"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Combined => "combined",
        }
    }
}

/// Values for each placeholder of a single render.
struct Bindings {
    values: BTreeMap<Placeholder, String>,
}

impl Bindings {
    fn new(
        selection: &AlgorithmSelection,
        cert: Option<&CertificateBlob>,
        required: &RequiredSymbols,
        guard: &GuardState,
    ) -> Self {
        let mut values = BTreeMap::from([
            (Placeholder::CertSigAlg, selection.signature_alg.to_string()),
            (Placeholder::CertKemAlg, selection.cert_kem_alg.to_string()),
            (Placeholder::EphKexAlg, selection.ephemeral_kex_alg.to_string()),
        ]);

        if let Some(cert) = cert {
            let (ca_sig, ca_kem) = match cert.algorithms() {
                Some(algs) => (algs.signature.to_string(), algs.kem.to_string()),
                None => (
                    selection.signature_alg.to_string(),
                    selection.cert_kem_alg.to_string(),
                ),
            };
            // A rejected render must stop the build even when the symbols are defined.
            let guard_expr = if guard.is_valid() {
                required.expression()
            } else {
                REJECTED_GUARD_EXPR.to_string()
            };
            values.insert(Placeholder::CaSigAlg, ca_sig);
            values.insert(Placeholder::CaKemAlg, ca_kem);
            values.insert(Placeholder::CaGuardExpr, guard_expr);
            values.insert(Placeholder::CaCertHex, cert.hex_literals());
            values.insert(Placeholder::CaCertLen, cert.declared_len().to_string());
        }

        Self { values }
    }

    fn check(&self, placeholders: &BTreeSet<Placeholder>) -> Result<()> {
        match placeholders.iter().find(|p| !self.values.contains_key(*p)) {
            Some(missing) => Err(MatrixError::MissingBinding(missing.as_str().to_string())),
            None => Ok(()),
        }
    }

    fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(p, v)| (p.as_str().to_string(), Value::String(v.clone())))
                .collect::<Map<String, Value>>(),
        )
    }
}

/// Handlebars renderer for header templates.
///
/// Strict mode turns a placeholder with no binding into an error instead of an empty
/// string, and escaping is disabled since the output is C, not HTML. Safe to share
/// between threads.
#[derive(Clone)]
pub struct MatrixRenderer {
    hbs: Handlebars<'static>,
}

impl MatrixRenderer {
    pub fn new() -> Self {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs }
    }

    /// Render `doc` for `selection` with `cert` embedded.
    pub fn render(
        &self,
        doc: &TemplateDocument,
        selection: &AlgorithmSelection,
        cert: &CertificateBlob,
    ) -> Result<RenderedArtifact> {
        self.render_with(doc, selection, Some(cert))
    }

    /// Render a document that needs no certificate (the defines-only header).
    pub fn render_defines(
        &self,
        doc: &TemplateDocument,
        selection: &AlgorithmSelection,
    ) -> Result<RenderedArtifact> {
        self.render_with(doc, selection, None)
    }

    fn render_with(
        &self,
        doc: &TemplateDocument,
        selection: &AlgorithmSelection,
        cert: Option<&CertificateBlob>,
    ) -> Result<RenderedArtifact> {
        let kex_group = kex_group(&selection.ephemeral_kex_alg)?;
        if let Some(cert) = cert {
            cert.verify_length()?;
        }

        let guards = FeatureGuardSet::for_selection(selection);
        let required = RequiredSymbols::for_render(selection, cert.and_then(|c| c.algorithms()));
        let mut guard = ConsistencyGuard::new();
        let guard = guard.check(selection, &guards, &required).clone();

        let bindings = Bindings::new(selection, cert, &required, &guard);
        bindings.check(doc.placeholders())?;
        tracing::debug!("rendering '{}' for {selection}", doc.name());

        let text = self
            .hbs
            .render_template(doc.source(), &bindings.to_json())
            .map_err(|e| MatrixError::TemplateRender(e.to_string()))?;

        Ok(RenderedArtifact {
            template: doc.name().to_string(),
            file_name: doc.file_name().to_string(),
            text,
            selection: selection.clone(),
            kex_group,
            guard,
        })
    }
}

impl Default for MatrixRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render every header `layout` calls for.
///
/// Templates that reference no certificate placeholder are rendered without the
/// certificate, so the defines header is identical across certificates.
pub fn render_headers(
    store: &TemplateStore,
    layout: ArtifactLayout,
    selection: &AlgorithmSelection,
    cert: &CertificateBlob,
) -> Result<Vec<RenderedArtifact>> {
    let renderer = MatrixRenderer::new();
    layout
        .templates()
        .iter()
        .map(|name| {
            let doc = store.get(name)?;
            if doc.placeholders().iter().any(Placeholder::needs_certificate) {
                renderer.render(doc, selection, cert)
            } else {
                renderer.render_defines(doc, selection)
            }
        })
        .collect()
}
