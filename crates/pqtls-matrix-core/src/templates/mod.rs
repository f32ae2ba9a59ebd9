//! Template system for experiment header generation.
//!
//! Header templates are embedded into the binary at compile-time via [`include_str!`]
//! in the [`embedded`] module, validated once into a [`document::TemplateDocument`],
//! served read-only from a [`store::TemplateStore`], and rendered with Handlebars by
//! [`crate::renderer::MatrixRenderer`].
//!
//! ## Template variables
//!
//! Placeholders use the Handlebars `{{name}}` syntax. The set of names is closed (see
//! [`document::Placeholder`]):
//! - `{{cert_sig_alg}}`, `{{cert_kem_alg}}`, `{{eph_kex_alg}}` — the configured algorithms
//! - `{{ca_sig_alg}}`, `{{ca_kem_alg}}` — the algorithms the embedded certificate was issued with
//! - `{{ca_guard_expr}}` — the `#if` condition guarding the certificate; `0` when rejected
//! - `{{ca_cert_hex}}`, `{{ca_cert_len}}` — the certificate byte array and its length
//!
//! An unknown `{{name}}`, a helper, or a block is rejected when the template is loaded,
//! not when the generated header is compiled.
//!
//! ## Adding a new template
//!
//! 1. Create the `.h` file under `templates/headers/`
//! 2. Add it to [`embedded::BUILTIN`] with its output file name
//! 3. Run `cargo test` to check that it parses
//!
//! **Warning**: the `#ifdef KEMTLS_EPH_KEX_*` blocks in the experiments templates must
//! stay in sync with [`crate::guard::KexGroup`]. A test checks this.

pub mod document;
pub mod embedded;
pub mod store;
