use anyhow::{Context, Result};
use clap::Parser;
use nexussync_core::NexusConfig;
use std::path::PathBuf;

mod api;
mod config;
mod terminal;

#[derive(Parser, Debug)]
#[command(name = "nexussync")]
#[command(about = "JAEGIS NexusSync dashboard API - natural-language terminal", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "NEXUSSYNC_CONFIG", default_value = "nexussync.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexussync_server=info,nexussync_core=info,tower_http=debug".into()),
        )
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    tracing::info!("Starting JAEGIS NexusSync dashboard API");

    let config = NexusConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, &config).await?;

    Ok(())
}
