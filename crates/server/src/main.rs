//! Framework Hub REST backend

use anyhow::Context;
use clap::Parser;
use fhub_common::config::StorageKind;
use fhub_common::HubConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fhub-server")]
#[command(about = "Framework Hub REST backend", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "FHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Storage backend (sqlite, memory)
    #[arg(long)]
    storage: Option<StorageKind>,

    /// SQLite database path
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("Framework Hub server v{}", fhub_common::VERSION);

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(fhub_common::default_config_path);
    let mut config = HubConfig::load_with_env(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(storage) = args.storage {
        config.server.storage = storage;
    }
    if let Some(db_path) = args.db_path {
        config.server.db_path = db_path;
    }

    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server.listen))?;

    let store = fhub_server::open_store(&config.server);
    fhub_server::serve(addr, store, &config.server.cors_origins).await
}
