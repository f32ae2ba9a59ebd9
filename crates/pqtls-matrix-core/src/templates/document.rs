//! Parsed header templates.
//!
//! Templates are Handlebars sources restricted to plain `{{name}}` expressions, where
//! every name is a [`Placeholder`]. Blocks, helpers and partials are rejected when the
//! template is loaded, so a template that parses can only ever substitute values.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use handlebars::template::{Template, TemplateElement};

use crate::error::{MatrixError, Result};

/// The closed set of names a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    CertSigAlg,
    CertKemAlg,
    EphKexAlg,
    CaSigAlg,
    CaKemAlg,
    CaGuardExpr,
    CaCertHex,
    CaCertLen,
}

impl Placeholder {
    pub const ALL: [Self; 8] = [
        Self::CertSigAlg,
        Self::CertKemAlg,
        Self::EphKexAlg,
        Self::CaSigAlg,
        Self::CaKemAlg,
        Self::CaGuardExpr,
        Self::CaCertHex,
        Self::CaCertLen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CertSigAlg => "cert_sig_alg",
            Self::CertKemAlg => "cert_kem_alg",
            Self::EphKexAlg => "eph_kex_alg",
            Self::CaSigAlg => "ca_sig_alg",
            Self::CaKemAlg => "ca_kem_alg",
            Self::CaGuardExpr => "ca_guard_expr",
            Self::CaCertHex => "ca_cert_hex",
            Self::CaCertLen => "ca_cert_len",
        }
    }

    /// True if the value comes from the certificate rather than the selection.
    pub fn needs_certificate(&self) -> bool {
        !matches!(self, Self::CertSigAlg | Self::CertKemAlg | Self::EphKexAlg)
    }

    /// The placeholder as it appears in template text, e.g. `{{ca_cert_len}}`.
    pub fn delimited(&self) -> String {
        format!("{{{{{}}}}}", self.as_str())
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placeholder {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| MatrixError::UnknownPlaceholder(s.to_string()))
    }
}

/// A validated template. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    name: String,
    file_name: String,
    source: String,
    placeholders: BTreeSet<Placeholder>,
}

impl TemplateDocument {
    /// Compile `source` and check every expression names a known [`Placeholder`].
    pub fn parse(name: &str, file_name: &str, source: &str) -> Result<Self> {
        let invalid = |reason: String| MatrixError::TemplateParse {
            template: name.to_string(),
            reason,
        };

        let compiled = Template::compile(source).map_err(|e| invalid(e.to_string()))?;
        let mut placeholders = BTreeSet::new();
        for element in &compiled.elements {
            match element {
                TemplateElement::RawString(_) | TemplateElement::Comment(_) => {}
                TemplateElement::Expression(expr) | TemplateElement::HtmlExpression(expr)
                    if expr.params.is_empty() && expr.hash.is_empty() =>
                {
                    let ident = expr.name.as_name().unwrap_or_default();
                    let placeholder = ident
                        .parse::<Placeholder>()
                        .map_err(|e| invalid(e.to_string()))?;
                    placeholders.insert(placeholder);
                }
                _ => {
                    return Err(invalid(
                        "only plain {{placeholder}} expressions are allowed".to_string(),
                    ))
                }
            }
        }

        tracing::debug!(
            "parsed template '{name}' ({} placeholders)",
            placeholders.len()
        );
        Ok(Self {
            name: name.to_string(),
            file_name: file_name.to_string(),
            source: source.to_string(),
            placeholders,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name the rendered header should be written to.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The Handlebars source, as loaded.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every distinct placeholder referenced by the document.
    pub fn placeholders(&self) -> &BTreeSet<Placeholder> {
        &self.placeholders
    }
}

/// Every distinct placeholder referenced by `doc`.
pub fn list_placeholders(doc: &TemplateDocument) -> BTreeSet<Placeholder> {
    doc.placeholders().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collects_placeholders() {
        let doc = TemplateDocument::parse(
            "t",
            "t.h",
            "#define KEMTLS_CERT_ROOT_SIG_{{cert_sig_alg}}\nint n = {{ca_cert_len}};",
        )
        .unwrap();
        assert_eq!(
            doc.placeholders().iter().copied().collect::<Vec<_>>(),
            vec![Placeholder::CertSigAlg, Placeholder::CaCertLen]
        );
        assert_eq!(doc.file_name(), "t.h");
    }

    #[test]
    fn test_adjacent_placeholders() {
        let doc =
            TemplateDocument::parse("t", "t.h", "{{cert_sig_alg}}{{cert_kem_alg}}").unwrap();
        assert_eq!(doc.placeholders().len(), 2);
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = TemplateDocument::parse("t", "t.h", "#define X_{{cert_sig}}").unwrap_err();
        match err {
            MatrixError::TemplateParse { template, reason } => {
                assert_eq!(template, "t");
                assert!(reason.contains("{{cert_sig}}"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_helpers_and_blocks_rejected() {
        for src in [
            "{{#if cert_sig_alg}}x{{/if}}",
            "{{lookup cert_sig_alg 0}}",
            "{{> partial}}",
        ] {
            assert!(
                matches!(
                    TemplateDocument::parse("t", "t.h", src),
                    Err(MatrixError::TemplateParse { .. })
                ),
                "{src}"
            );
        }
    }

    #[test]
    fn test_unbalanced_braces_rejected() {
        assert!(matches!(
            TemplateDocument::parse("t", "t.h", "#define X_{{cert_sig_alg"),
            Err(MatrixError::TemplateParse { .. })
        ));
    }

    #[test]
    fn test_c_syntax_is_literal() {
        let src = "const char a[] = { 0x01, 0x02 };\n/* costs $5 */\n";
        let doc = TemplateDocument::parse("t", "t.h", src).unwrap();
        assert!(doc.placeholders().is_empty());
        assert_eq!(doc.source(), src);
    }

    #[test]
    fn test_list_placeholders_is_distinct() {
        let doc = TemplateDocument::parse(
            "t",
            "t.h",
            "{{eph_kex_alg}} {{eph_kex_alg}} {{ca_cert_hex}}",
        )
        .unwrap();
        let set = list_placeholders(&doc);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Placeholder::EphKexAlg));
        assert!(set.contains(&Placeholder::CaCertHex));
    }

    #[test]
    fn test_placeholder_names_roundtrip() {
        for p in Placeholder::ALL {
            assert_eq!(p.as_str().parse::<Placeholder>().unwrap(), p);
            assert_eq!(p.delimited(), format!("{{{{{}}}}}", p.as_str()));
        }
    }

    #[test]
    fn test_unknown_name_is_not_a_missing_binding() {
        match "typo_alg".parse::<Placeholder>() {
            Err(MatrixError::UnknownPlaceholder(name)) => assert_eq!(name, "typo_alg"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
