//! Desk dashboard sync client - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Realtime trading dashboard sync client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via DESK_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // TLS crypto provider must be installed before any channel connections
    desk_channel::init_crypto();

    let args = Args::parse();

    desk_client::logging::init_logging();

    info!("Starting desk client v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("DESK_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = if std::path::Path::new(&config_path).exists() {
        desk_client::AppConfig::from_file(&config_path)?
    } else {
        tracing::warn!(path = %config_path, "Config file not found, using defaults");
        desk_client::AppConfig::default()
    };
    info!(base_url = %config.server.base_url, push_url = %config.server.push_url, "Configuration loaded");

    let app = desk_client::Application::new(config)?;
    app.run().await?;

    Ok(())
}
