use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use careflow_gate::config;
use careflow_gate::database::DatabaseManager;
use careflow_gate::routes;
use careflow_gate::state::AppState;

#[derive(Parser)]
#[command(name = "careflow-gate")]
#[command(about = "Careflow access gating service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP service (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides CAREFLOW_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Query the /api/health endpoint of a running service")]
    Health {
        #[arg(help = "Base URL, e.g. http://localhost:3000")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and SECURITY_JWT_SECRET
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("careflow_gate=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(port).await,
        Command::Health { url } => health(&url).await,
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting Careflow gate in {} mode", config.environment_name());

    if config.security.jwt_secret.is_empty() {
        bail!("SECURITY_JWT_SECRET must be set outside development");
    }

    let app = routes::app(AppState::from_config(config));

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.api.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health(base_url: &str) -> anyhow::Result<()> {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    let body: Value = response.json().await.context("health response was not JSON")?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        bail!("health check returned {}", status);
    }
    Ok(())
}
