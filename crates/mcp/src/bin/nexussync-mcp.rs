// Standalone MCP server binary (stdio transport)

use anyhow::{Context, Result};
use nexussync_core::{CommandExecutor, NexusConfig};
use nexussync_mcp::tools::builtin_registry;
use nexussync_mcp::McpServer;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries protocol messages, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("NexusSync MCP Server starting...");

    let config_path = std::env::var("NEXUSSYNC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("nexussync.toml"));
    let config = NexusConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let registry = builtin_registry(config.cli.program.clone())?;
    tracing::info!(
        "Registered {} tools backed by {}",
        registry.len(),
        registry.program()
    );

    let executor = CommandExecutor::from_config(&config.cli);
    let server = Arc::new(McpServer::new(registry, executor).with_protocol_config(&config.protocol));
    server.start(shutdown_signal()).await?;

    tracing::info!("NexusSync MCP Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
