//! Unified error types for the pqtls-matrix toolkit.

use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur while selecting, rendering, or validating headers.
#[derive(Error, Debug)]
pub enum MatrixError {
    // --- Configuration ---

    /// The configuration file (`pqtls-matrix.config.json` or `manifest.json`) was not found.
    #[error("config file not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file exists but contains invalid JSON.
    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // --- Templates ---

    /// No template with this name is registered in the store.
    #[error("template not found: {name} (available: {available})")]
    TemplateNotFound { name: String, available: String },

    /// A template references an unknown placeholder or is otherwise malformed.
    #[error("template '{template}' is invalid: {reason}")]
    TemplateParse { template: String, reason: String },

    /// The name is not one of the closed set of template placeholders.
    #[error("unknown placeholder {{{{{0}}}}}")]
    UnknownPlaceholder(String),

    /// A placeholder in the template has no value in the render inputs.
    #[error("no binding for placeholder {{{{{0}}}}}")]
    MissingBinding(String),

    /// Handlebars failed while substituting a validated template.
    #[error("template rendering failed: {0}")]
    TemplateRender(String),

    // --- Algorithms ---

    /// The value cannot be used as part of a preprocessor symbol name.
    #[error("invalid algorithm identifier: '{0}' (expected [A-Za-z_][A-Za-z0-9_]*)")]
    InvalidIdentifier(String),

    /// The identifier is outside the fixed table for this algorithm kind.
    #[error("unsupported {kind} algorithm: {id}")]
    UnsupportedAlgorithm { kind: &'static str, id: String },

    // --- Certificate ---

    /// The certificate file does not exist.
    #[error("certificate not found: {0}")]
    CertificateNotFound(PathBuf),

    /// The certificate could not be decoded (bad PEM armor or base64 body).
    #[error("failed to decode certificate {path}: {reason}")]
    CertificateDecode { path: PathBuf, reason: String },

    /// The declared certificate length disagrees with the actual byte count.
    #[error("certificate length mismatch: declared {declared} bytes, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    // --- Guard ---

    /// The certificate's algorithms do not match the configured signature/KEM pair.
    #[error("certificate and configured SIG/KEM mismatch: requires {sig_symbol} && {kem_symbol}")]
    ConsistencyRejected {
        sig_symbol: String,
        kem_symbol: String,
    },

    // --- General ---

    /// A filesystem I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A catch-all for errors from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Alias for `Result<T, MatrixError>`.
pub type Result<T> = std::result::Result<T, MatrixError>;
