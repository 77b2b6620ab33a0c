//! Remote consumer of a storage node

use std::path::PathBuf;

use tokio::net::TcpStream;

use crate::audio::PlaybackSink;
use crate::config::{AppConfig, TransferConfig};
use crate::error::{Error, ProtocolError, Result, TransportError};
use crate::protocol::{FileEntry, Frame, FramedStream};
use crate::storage::FileStore;
use crate::transfer::TransferDecoder;
use crate::wav::WavContainer;

/// Client for one server address; every call opens its own connection
#[derive(Debug, Clone)]
pub struct AudioClient {
    address: String,
    transfer: TransferConfig,
}

impl AudioClient {
    pub fn new(address: impl Into<String>, transfer: TransferConfig) -> Self {
        Self {
            address: address.into(),
            transfer,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.client.server_address.clone(), config.transfer.clone())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connect(&self) -> Result<FramedStream<TcpStream>> {
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(TransportError::Io)?;
        stream.set_nodelay(true).map_err(TransportError::Io)?;
        Ok(FramedStream::new(stream))
    }

    /// `.wav` files in a directory on the server
    pub async fn list(&self, directory: &str) -> Result<Vec<FileEntry>> {
        let mut framed = self.connect().await?;
        framed
            .write(&Frame::ListRequest {
                directory: directory.to_string(),
            })
            .await?;

        match framed.read().await? {
            Some(Frame::Listing { entries }) => Ok(entries),
            Some(Frame::Error { message }) => {
                tracing::error!("Listing '{}' failed with error: {}", directory, message);
                Err(ProtocolError::Remote(message).into())
            }
            Some(other) => Err(ProtocolError::UnexpectedMessage(other.kind()).into()),
            None => Err(TransportError::Closed.into()),
        }
    }

    /// Receive a file and require it to be a valid container
    pub async fn fetch(&self, name: &str) -> Result<WavContainer> {
        let mut framed = self.connect().await?;
        framed
            .write(&Frame::DownloadRequest {
                name: name.to_string(),
            })
            .await?;

        let mut decoder = TransferDecoder::from_config(&self.transfer);
        let container = match decoder.receive(&mut framed).await {
            Ok(container) => container,
            Err(e) => {
                tracing::error!("Error while downloading the file '{}': {}", name, e);
                return Err(e.into());
            }
        };

        let declared = container.data.size;
        if decoder.bytes_received() != declared as u64 {
            tracing::error!("Received file '{}' does not have its declared size", name);
            return Err(ProtocolError::LengthMismatch {
                declared,
                received: decoder.bytes_received(),
            }
            .into());
        }

        let report = container.validate();
        if !report.is_valid() {
            tracing::error!("Received file '{}' is not valid: {}", name, report);
            return Err(Error::InvalidContainer(report.to_string()));
        }
        Ok(container)
    }

    /// Fetch `name` and store it as `output_name`; nothing is written on failure
    pub async fn download(
        &self,
        name: &str,
        store: &FileStore,
        output_name: &str,
    ) -> Result<PathBuf> {
        let container = self.fetch(name).await?;
        let path = store.store_container(output_name, &container).await?;
        Ok(path)
    }

    /// Fetch `name` and play it on `sink`, handing the sink back afterwards
    pub async fn play<S>(&self, name: &str, mut sink: S) -> Result<S>
    where
        S: PlaybackSink + 'static,
    {
        let container = self.fetch(name).await?;
        if !container.format.is_pcm() {
            return Err(Error::Playback(format!(
                "Cannot play '{}', it is not a PCM file",
                name
            )));
        }

        tokio::task::spawn_blocking(move || sink.play(&container).map(|()| sink))
            .await
            .map_err(|e| Error::Playback(e.to_string()))?
    }
}
