use anyhow::Result;
use clap::Parser;
use hirelens::core::ConfigManager;
use hirelens::web::start_web_server;
use std::path::PathBuf;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Backend for the candidate pipeline explorer dashboard.
#[derive(Parser)]
#[command(name = "hirelens", version, about)]
struct Args {
    /// Port for the dashboard API server
    #[arg(long, env = "ROCKET_PORT", default_value_t = 8000)]
    port: u16,

    /// Env file holding the access token and query defaults
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or(EnvFilter::new("hirelens=INFO,rocket::server=OFF")),
        )
        .init();

    let args = Args::parse();
    let config = ConfigManager::load(&args.env_file)?;

    info!("Env file: {}", args.env_file.display());
    info!("Upstream API: {}", config.upstream_url());
    info!("Relay: {}", config.relay_url());
    info!("Default page size: {}", config.default_page_size());
    info!("Server: http://0.0.0.0:{}", args.port);

    start_web_server(config, args.port).await
}
