//! Storage Node Application
//!
//! Serves the `.wav` files of a directory to remote clients.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use wavlink::{config::AppConfig, network::AudioServer};

#[derive(Parser)]
#[command(name = "server")]
#[command(author, version, about = "Serve WAV files to remote clients")]
struct Cli {
    /// Directory holding the audio files
    storage_root: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(root) = cli.storage_root {
        config.server.storage_root = root;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    // Initialize logging
    wavlink::logging::init(&config.logging)?;

    tracing::info!("Starting WAV storage node");

    if !config.server.storage_root.is_dir() {
        anyhow::bail!(
            "Storage root {} is not a directory",
            config.server.storage_root.display()
        );
    }

    let server = AudioServer::new(&config);
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
