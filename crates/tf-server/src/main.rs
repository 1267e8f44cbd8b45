use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tf_core::config::TfConfig;
use tf_server::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "tokenflow", version, about = "TokenFlow routing sandbox API server")]
struct Cli {
    /// Config file (overrides TF_CONFIG and ./tokenflow.toml).
    #[arg(long, short)]
    config: Option<PathBuf>,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_path) = TfConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.server.json_logs |= cli.json_logs;

    init_tracing(config.server.json_logs);
    match &config_path {
        Some(path) => tracing::info!(path = %path.display(), "configuration loaded"),
        None => tracing::info!("no configuration file found, using defaults"),
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config).context("building application state")?;
    let seeded = state.seed_scenarios().await.context("seeding sample scenarios")?;
    tracing::info!(providers = state.registry.len(), scenarios = seeded, "state ready");

    let app = tf_server::app_with_state(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    tracing::info!(%addr, "TokenFlow API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tf_server=debug,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("received SIGINT, shutting down");
}
