//! Powiernik Server Binary
//!
//! Serves the Wizyta frontend and its local API.
//!
//! ## Usage
//!
//! ```bash
//! # Start with settings from powiernik.toml / POWIERNIK_* env vars
//! cargo run --bin powiernik
//!
//! # Serve an install directory on a custom port, plain HTTP
//! cargo run --bin powiernik -- --base-dir /opt/powiernik --port 9000 --no-tls
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use powiernik::{logging, server, Config};

#[derive(Parser, Debug)]
#[command(name = "powiernik", version, about = "Local backend for the Wizyta frontend")]
struct Args {
    /// Settings file (defaults to powiernik.toml + powiernik.local.toml)
    #[arg(long)]
    config: Option<String>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Listening port
    #[arg(long)]
    port: Option<u16>,

    /// Install directory holding index.html, assets/, config.json, logs/ and ssl/
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Serve plain HTTP even when a certificate could be generated
    #[arg(long)]
    no_tls: bool,
}

impl Args {
    fn load_config(&self) -> Config {
        let loaded = match &self.config {
            Some(path) => Config::from_file(path),
            None => Config::load(),
        };
        let mut config = loaded.unwrap_or_else(|e| {
            eprintln!("Using default configuration ({e})");
            Config::default()
        });

        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(base_dir) = &self.base_dir {
            config.paths.base_dir.clone_from(base_dir);
        }
        if self.no_tls {
            config.tls.enabled = false;
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.load_config();

    logging::init(&config.paths.log_dir(), &config.logging);

    match start(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn start(config: Config) -> anyhow::Result<()> {
    let port = config.server.port;
    server::run(config)
        .await
        .with_context(|| format!("server on port {port} stopped"))
}
