//! pqtls-matrix CLI — header generator for post-quantum TLS experiments.
//!
//! Provides five commands: `init`, `render`, `matrix`, `templates`, and `check`.
//!
//! All rendering goes through [`pqtls_matrix_core::renderer`]; this crate only
//! resolves inputs (flags, prompts, config, certificate files) and writes results.

mod commands;
mod output;
mod prompt;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use pqtls_matrix_core::config::CONFIG_FILE;
use pqtls_matrix_core::renderer::ArtifactLayout;

#[derive(Parser)]
#[command(
    name = "pqtls-matrix",
    about = "Configuration headers for KEMTLS experiments — one per SIG × KEM × KEX",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to pqtls-matrix.config.json
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and create the certificate/output directories
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Render the headers for one algorithm selection
    Render {
        /// Root certificate signature algorithm (prompted if omitted)
        #[arg(long)]
        sig: Option<String>,

        /// Root certificate KEM algorithm (prompted if omitted)
        #[arg(long)]
        kem: Option<String>,

        /// Ephemeral key-exchange algorithm (prompted if omitted)
        #[arg(long)]
        kex: Option<String>,

        /// Certificate file (default: <certificate_dir>/<sig>_<kem>_<NNNN>_ca.crt)
        #[arg(long)]
        cert: Option<PathBuf>,

        /// Override the certificate testcase number
        #[arg(long)]
        testcase: Option<u32>,

        /// Override the header layout
        #[arg(long, value_enum)]
        layout: Option<LayoutChoice>,

        /// Output directory (default: the config's output_dir)
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Exit successfully even if the consistency guard rejects the pairing
        #[arg(long)]
        allow_mismatch: bool,
    },

    /// Render every combination in the configured matrix
    Matrix {
        /// Number of concurrent renders
        #[arg(long, short, default_value = "4")]
        jobs: usize,
    },

    /// List available templates and their placeholders
    Templates,

    /// Evaluate the consistency guard for a selection without rendering
    Check {
        /// Root certificate signature algorithm
        #[arg(long)]
        sig: String,

        /// Root certificate KEM algorithm
        #[arg(long)]
        kem: String,

        /// Ephemeral key-exchange algorithm
        #[arg(long, default_value = "kyber512")]
        kex: String,

        /// Certificate file whose name records its issuing algorithms
        #[arg(long)]
        cert: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LayoutChoice {
    Split,
    Combined,
}

impl From<LayoutChoice> for ArtifactLayout {
    fn from(choice: LayoutChoice) -> Self {
        match choice {
            LayoutChoice::Split => ArtifactLayout::Split,
            LayoutChoice::Combined => ArtifactLayout::Combined,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init { dir } => {
            commands::init::run(&dir).await?;
        }
        Commands::Render {
            sig,
            kem,
            kex,
            cert,
            testcase,
            layout,
            out,
            allow_mismatch,
        } => {
            let request = commands::render::RenderRequest {
                sig,
                kem,
                kex,
                cert,
                testcase,
                layout: layout.map(Into::into),
                out,
                allow_mismatch,
            };
            commands::render::run(&cli.config, request).await?;
        }
        Commands::Matrix { jobs } => {
            commands::matrix::run(&cli.config, jobs).await?;
        }
        Commands::Templates => {
            commands::templates::run(&cli.config).await?;
        }
        Commands::Check {
            sig,
            kem,
            kex,
            cert,
            json,
        } => {
            commands::check::run(&sig, &kem, &kex, cert.as_deref(), json).await?;
        }
    }

    Ok(())
}
