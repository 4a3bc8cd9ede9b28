//! Energy Tracker Server
//!
//! Run with: cargo run --bin energy-tracker
//!
//! # Configuration
//!
//! Read from `--config` or the first of
//! `~/.config/energy-tracker/config.toml`, `/etc/energy-tracker/config.toml`
//! and `./config.toml`. `ENERGY_TRACKER_*` environment variables override
//! file values; `RUST_LOG` overrides the configured log level.

use clap::Parser;
use energy_tracker::api::{serve, ApiConfig, AppState};
use energy_tracker::config::{Config, LoggingConfig};
use energy_tracker::dashboard::DashboardController;
use energy_tracker::store::MemoryStore;
use energy_tracker::websocket::HubConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "energy-tracker")]
#[command(about = "Smart Energy Tracker server")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);

    tracing::info!("Starting energy tracker v{}", env!("CARGO_PKG_VERSION"));

    // Open the store
    let store_config = config.store.to_store_config();
    match &store_config.wal_path {
        Some(wal) => {
            std::fs::create_dir_all(&config.store.data_dir)?;
            tracing::info!("Store WAL: {:?}", wal);
        }
        None => tracing::warn!("WAL disabled; store contents are lost on exit"),
    }
    let store = Arc::new(MemoryStore::open(store_config)?);

    // Bind the dashboard to the store
    let controller = Arc::new(DashboardController::new(
        store.clone(),
        config.dashboard.to_settings(),
    ));
    let bindings = controller.start().await?;

    let api_config = ApiConfig::from(&config.server);
    let state = AppState::with_ws_config(
        Arc::clone(&controller),
        api_config.clone(),
        HubConfig::from(&config.server),
    );
    let forwarder = Arc::clone(&state.ws_hub).spawn_forwarder(controller.subscribe_updates());

    serve(state, &api_config).await?;

    // Graceful shutdown
    tracing::info!("Stopping dashboard bindings...");
    bindings.abort();
    forwarder.abort();
    store.sync().await?;

    tracing::info!("Energy tracker stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter_directive().into());
    let json = logging.is_json();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}
