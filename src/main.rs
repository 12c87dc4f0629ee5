use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use admin_gate::auth::SharedProvider;
use admin_gate::server::{app, AppState};

#[derive(Parser)]
#[command(name = "admin-gate")]
#[command(about = "Personal site server with a session-gated admin area")]
#[command(version)]
struct Cli {
    #[arg(long, env = "HOST", default_value = "0.0.0.0", help = "Address to bind")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 3000, help = "Port to listen on")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up AUTH_PROVIDER_URL and friends
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("admin_gate=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    // Initialize configuration (this loads the config singleton)
    let config = admin_gate::config::config();
    tracing::info!("Starting admin gate in {:?} mode", config.environment);

    // Missing or malformed provider settings abort startup
    let provider = SharedProvider::new(&config.auth).context("auth provider configuration")?;
    let state = AppState::new(config.gate.clone(), Arc::new(provider));
    let app = app(state, config.server.enable_request_logging);

    let bind_addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Admin gate listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
