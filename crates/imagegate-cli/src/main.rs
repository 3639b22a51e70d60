//! Imagegate CLI — entry point.
//!
//! # Commands
//!
//! - `imagegate serve [--host H] [--port P]` — HTTP front end (`GET /`, `POST /generate`)
//! - `imagegate generate -p PROMPT [--size S]` — single-shot generation
//! - `imagegate status` — show configuration and auth mode
//! - `imagegate init` — write a starter config file

mod helpers;
mod init;
mod server;
mod status;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use imagegate_core::config::{get_config_path, load_config, Config};
use imagegate_core::GenerationRequest;
use imagegate_providers::{generate_guarded, ImageGateway};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🖼 Imagegate — a thin gateway in front of hosted image-generation models
#[derive(Parser)]
#[command(name = "imagegate", version, about, long_about = None)]
struct Cli {
    /// Path to the config file (default: ~/.imagegate/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP front end
    Serve {
        /// Bind host (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Generate one image and print its URL
    Generate {
        /// Text prompt
        #[arg(short, long)]
        prompt: String,

        /// Image size, e.g. 1024x1024 (default: provider.size)
        #[arg(short, long)]
        size: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,

    /// Write a starter config file
    Init,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .as_deref()
        .map(helpers::expand_tilde)
        .unwrap_or_else(get_config_path);

    match cli.command {
        Commands::Serve { host, port, logs } => {
            init_logging(logs, "info");
            let config = load_config(Some(&config_path));
            server::run(config, host, port).await
        }
        Commands::Generate { prompt, size, logs } => {
            init_logging(logs, "warn");
            let config = load_config(Some(&config_path));
            run_generate(config, &prompt, size).await
        }
        Commands::Status => status::run(&load_config(Some(&config_path)), &config_path),
        Commands::Init => init::run(&load_config(Some(&config_path)), &config_path),
    }
}

// ─────────────────────────────────────────────
// Generate command
// ─────────────────────────────────────────────

async fn run_generate(config: Config, prompt: &str, size: Option<String>) -> Result<()> {
    let request = GenerationRequest::new(prompt)?
        .with_size(config.provider.size.as_str())
        .with_size(size.unwrap_or_default());

    let gateway = ImageGateway::from_settings(&config.provider)?;
    debug!(gateway = ?gateway, "gateway ready");

    let result = generate_guarded(Arc::new(gateway), request).await;
    helpers::print_result(&result);

    match result.error_kind() {
        None => Ok(()),
        Some(kind) => bail!("image generation failed ({kind})"),
    }
}

/// Initialize tracing/logging.
///
/// `--logs` forces debug output for the imagegate crates; otherwise `RUST_LOG`
/// wins over the per-command default.
fn init_logging(verbose: bool, default: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("imagegate=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
