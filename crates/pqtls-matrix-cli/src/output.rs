//! Terminal output formatting for the pqtls-matrix CLI.
//!
//! Provides consistent, colored output using the [`console`] crate.

use std::path::Path;

use console::style;

use pqtls_matrix_core::guard::GuardState;
use pqtls_matrix_core::renderer::RenderedArtifact;

/// Print a bold cyan header with an underline separator.
pub fn print_header(text: &str) {
    println!("\n{}", style(text).bold().cyan());
    println!("{}", style("=".repeat(text.len())).dim());
}

/// Print a success message prefixed with green `[OK]`.
pub fn print_success(text: &str) {
    println!("{} {}", style("[OK]").green().bold(), text);
}

/// Print a warning message prefixed with yellow `[WARN]`.
pub fn print_warning(text: &str) {
    println!("{} {}", style("[WARN]").yellow().bold(), text);
}

/// Print an error message prefixed with red `[ERROR]`.
pub fn print_error(text: &str) {
    println!("{} {}", style("[ERROR]").red().bold(), text);
}

/// Print a progress step indicator like `[1/3] Loading certificate...`.
pub fn print_step(step: u32, total: u32, text: &str) {
    println!("{} {}", style(format!("[{step}/{total}]")).dim(), text);
}

/// Print a key-value pair with dimmed key formatting.
pub fn print_key_value(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Print the consistency guard outcome for one render.
pub fn print_guard_state(state: &GuardState) {
    match state {
        GuardState::Valid => print_key_value("Guard", &style("valid").green().to_string()),
        GuardState::Unvalidated => print_key_value("Guard", "not evaluated"),
        GuardState::Rejected(rejection) => {
            print_key_value("Guard", &style("REJECTED").red().bold().to_string());
            print_key_value("Requires", &rejection.required.expression());
            print_key_value("Reason", &rejection.to_string());
        }
    }
}

/// Print one written header with its size and whether it will compile.
pub fn print_written(path: &Path, artifact: &RenderedArtifact) {
    let marker = if artifact.is_buildable() {
        style("ok").green()
    } else {
        style("#error").red()
    };
    println!(
        "  {} {} ({} bytes)",
        marker,
        path.display(),
        artifact.text().len()
    );
}
