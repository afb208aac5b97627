use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use docchat_cli::http::create_router;
use docchat_cli::services::{base_dir, build_app_state};
use docchat_cli::telemetry::init_tracing;
use docchat_core::config::Config;

/// Document chat HTTP API.
#[derive(Parser, Debug)]
#[command(name = "docchat-server", version)]
struct Cli {
    /// Listen host (overrides server.host)
    #[arg(long)]
    host: Option<String>,
    /// Listen port (overrides server.port)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Config::load().context("Error loading config")?.settings()?;
    init_tracing(&settings.logging);

    let state = build_app_state(&settings, &base_dir()?).await?;
    let app = create_router(state, settings.server.cors);

    let host = cli.host.unwrap_or(settings.server.host);
    let port = cli.port.unwrap_or(settings.server.port);
    let addr: SocketAddr = format!("{host}:{port}").parse().context("Invalid HTTP listen address")?;
    let listener = TcpListener::bind(&addr).await.context("Failed to bind HTTP server")?;
    info!("HTTP API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("HTTP server shutting down");
        })
        .await
        .context("HTTP server error")?;
    Ok(())
}
