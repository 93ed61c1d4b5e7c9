//! Framework Hub CLI - Main Entry Point
//!
//! Manages build logs, generated code and Jenkins triggers against the
//! Framework Hub API, falling back to a local store when it is unreachable.

use anyhow::Context;
use clap::{Parser, Subcommand};
use fhub_client::Hub;
use fhub_common::{HubConfig, LocalStore, SelectionMode};
use std::path::{Path, PathBuf};
use tracing::debug;

mod commands;
mod output;

use commands::{code, jenkins, logs, stats};

/// Framework Hub CLI
#[derive(Parser)]
#[command(name = "fhub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Remote API base URL
    #[arg(long, env = "FHUB_API_URL", global = true)]
    api_url: Option<String>,

    /// Configuration file
    #[arg(long, env = "FHUB_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Local fallback store (SQLite file, or "memory")
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Backend selection (per-call, per-session, offline)
    #[arg(long, global = true)]
    selection: Option<SelectionMode>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the API is reachable
    Status,

    /// Manage build logs
    #[command(subcommand)]
    Logs(logs::LogCommands),

    /// Manage generated code snippets
    #[command(subcommand)]
    Code(code::CodeCommands),

    /// Show aggregate counts
    Stats,

    /// Trigger Jenkins jobs
    #[command(subcommand)]
    Jenkins(jenkins::JenkinsCommands),

    /// Show version information
    Version,
}

const MEMORY_STORE: &str = "memory";

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(fhub_common::default_config_path);
    let mut config = HubConfig::load_with_env(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let client = &mut config.client;
    if let Some(url) = cli.api_url {
        client.api_url = url;
    }
    if let Some(selection) = cli.selection {
        client.selection = selection;
    }
    let in_memory = cli.store.as_deref() == Some(Path::new(MEMORY_STORE));
    if let Some(store) = cli.store.filter(|_| !in_memory) {
        client.store_path = store;
    }

    debug!(
        "API {} with {} selection, local store {}",
        client.api_url,
        client.selection,
        if in_memory {
            MEMORY_STORE.to_string()
        } else {
            client.store_path.display().to_string()
        }
    );

    let hub = if in_memory {
        Hub::with_store(client, LocalStore::in_memory())?
    } else {
        Hub::from_config(client)
            .with_context(|| format!("opening local store {}", client.store_path.display()))?
    };

    match cli.command {
        Commands::Status => {
            if hub.is_online().await {
                output::print_success(&format!("API is reachable at {}", client.api_url));
            } else {
                output::print_warning(&format!(
                    "API is not reachable at {}, local storage will be used",
                    client.api_url
                ));
                std::process::exit(1);
            }
        }
        Commands::Logs(cmd) => logs::execute(cmd, &hub, cli.format).await?,
        Commands::Code(cmd) => code::execute(cmd, &hub, cli.format).await?,
        Commands::Stats => stats::execute(&hub, cli.format).await?,
        Commands::Jenkins(cmd) => jenkins::execute(cmd, &hub, cli.format).await?,
        Commands::Version => {
            println!("Framework Hub CLI v{}", fhub_common::VERSION);
            output::print_info(&format!("API: {}", client.api_url));
            output::print_info(&format!("Selection: {}", client.selection));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
