//! Client Application
//!
//! Lists, downloads and plays files from a storage node.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use wavlink::{config::AppConfig, network::AudioClient, storage::FileStore};

#[derive(Parser)]
#[command(name = "client")]
#[command(author, version, about = "Fetch WAV files from a storage node")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server address, host:port
    #[arg(short, long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the .wav files in a server directory
    List {
        #[arg(default_value = ".")]
        directory: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a file
    Download {
        name: String,

        /// Directory to write into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Play a file on an output device
    Play {
        name: String,

        /// Output device name
        #[arg(long)]
        device: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.client.server_address = server;
    }

    // Initialize logging
    wavlink::logging::init(&config.logging)?;

    let client = AudioClient::from_config(&config);

    match cli.command {
        Commands::List { directory, json } => {
            let entries = client.list(&directory).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    println!("{:>12}  {}", entry.size, entry.name);
                }
            }
        }
        Commands::Download { name, output_dir } => {
            let dir = output_dir.unwrap_or_else(|| config.client.download_dir.clone());
            let output_name = Path::new(&name)
                .file_name()
                .context("Download name has no file name")?
                .to_string_lossy()
                .into_owned();

            let store = FileStore::new(dir);
            let path = client
                .download(&name, &store, &output_name)
                .await
                .with_context(|| format!("Something went wrong with 'download {}'", name))?;
            tracing::info!("Downloaded {} to {}", name, path.display());
        }
        Commands::Play { name, device } => play(&client, &name, device).await?,
    }

    Ok(())
}

#[cfg(feature = "playback")]
async fn play(client: &AudioClient, name: &str, device: Option<String>) -> Result<()> {
    let sink = wavlink::audio::DeviceSink::new(device);
    client
        .play(name, sink)
        .await
        .with_context(|| format!("Something went wrong with 'play {}'", name))?;
    Ok(())
}

#[cfg(not(feature = "playback"))]
async fn play(_client: &AudioClient, name: &str, _device: Option<String>) -> Result<()> {
    tracing::warn!("Cannot play {}: built without the `playback` feature", name);
    anyhow::bail!("Playing is not supported in this build")
}
