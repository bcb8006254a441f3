//! Videosphere API server

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use videosphere_server::{ServiceConfig, build_state, router, shutdown_signal};

/// Command-line options, applied over the loaded configuration
#[derive(Parser, Debug)]
#[command(
    name = "videosphere",
    version,
    about = "Video API with Clerk bearer-token authentication"
)]
struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(long, short = 'c', env = "VIDEOSPHERE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut ServiceConfig) {
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        ServiceConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);

    config.logging.init().context("Failed to initialize logging")?;

    let state = build_state(&config).context("Failed to build token verifier")?;
    let app = router(state, &config.cors);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "Videosphere API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
