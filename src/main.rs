use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use cinelink_engine::engine::catalog::InMemoryCatalog;
use cinelink_engine::engine::config::{load_config, load_default_config};
use cinelink_engine::engine::driver::CommandDriver;
use cinelink_engine::engine::registry::SessionRegistry;

#[derive(Parser)]
#[command(name = "cinelink-engine", about = "Movie connection game engine (JSON lines on stdin/stdout)")]
struct Cli {
    /// Path to the movie catalog JSON (overrides engine.toml)
    #[arg(long, env = "CINELINK_CATALOG")]
    catalog: Option<PathBuf>,

    /// Path to engine.toml (default: auto-discover)
    #[arg(long, env = "CINELINK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries responses, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => load_config(path).map_err(|e| format!("Failed to load config: {}", e))?,
        None => load_default_config(),
    };

    let catalog_path = cli
        .catalog
        .or_else(|| config.catalog.clone())
        .ok_or("no catalog given (use --catalog, CINELINK_CATALOG or `catalog` in engine.toml)")?;
    let catalog = tokio::task::spawn_blocking(move || InMemoryCatalog::load(&catalog_path))
        .await?
        .map_err(|e| format!("Failed to load catalog: {}", e))?;

    let driver = CommandDriver::new(SessionRegistry::new(Arc::new(catalog)), config.match_defaults);
    tracing::info!("ready for commands on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = driver.handle_line(&line);
        stdout.write_all(response.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    tracing::info!(live_sessions = driver.registry().len(), "stdin closed, shutting down");
    Ok(())
}
