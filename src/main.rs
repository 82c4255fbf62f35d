use anyhow::Context;
use clap::Parser;
use std::net::IpAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use plateau_recorder::config::AppConfig;
use plateau_recorder::database::MySqlStore;
use plateau_recorder::handlers::AppState;
use plateau_recorder::recorder::Recorder;

#[derive(Parser)]
#[command(name = "plateau-recorder")]
#[command(about = "HTTP endpoint recording plateau monitor durations")]
#[command(version)]
struct Args {
    #[arg(long, help = "Address to bind (overrides PLATEAU_BIND)")]
    bind: Option<IpAddr>,

    #[arg(long, help = "Port to listen on (overrides PLATEAU_PORT / PORT)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, PLATEAU_DB_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(bind) = args.bind {
        config.api.bind = bind;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    tracing::info!("Starting plateau recorder in {:?} mode", config.environment);
    tracing::debug!("database: {:?}", config.database);

    let store = MySqlStore::new(&config.database);
    let state = AppState {
        recorder: Recorder::new(Arc::new(store)),
    };
    let app = plateau_recorder::app(state, &config);

    let bind_addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
