//! Core library for the pqtls-matrix toolkit.
//!
//! Generates the configuration headers that pin a post-quantum TLS experiment build to
//! one point of the algorithm matrix (root certificate signature × certificate KEM ×
//! ephemeral key exchange) and embed the matching root certificate.
//!
//! - [`templates`] — embedded header templates and the read-only [`templates::store::TemplateStore`]
//! - [`renderer`] — pure placeholder substitution producing [`renderer::RenderedArtifact`]s
//! - [`guard`] — the consistency guard checking certificate and configuration agree
//! - [`matrix`], [`config`], [`emit`], [`manifest`] — running the whole matrix to disk

pub mod algorithm;
pub mod certificate;
pub mod config;
pub mod emit;
pub mod error;
pub mod guard;
pub mod manifest;
pub mod matrix;
pub mod renderer;
pub mod templates;
