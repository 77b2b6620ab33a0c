//! Storage node: answers catalog queries and streams files
//!
//! One tokio task per connection. A connection may carry any number of
//! requests; each download is an independent transfer with its own payload
//! buffer.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{AppConfig, ServerConfig, TransferConfig};
use crate::error::{ProtocolError, Result, TransportError};
use crate::protocol::{Frame, FramedStream};
use crate::storage::FileStore;
use crate::transfer::{MessageSink, TransferEncoder};

/// State shared by all connection tasks
struct Handler {
    store: FileStore,
    encoder: TransferEncoder,
}

/// TCP server exposing a [`FileStore`]
pub struct AudioServer {
    config: ServerConfig,
    handler: Arc<Handler>,
}

impl AudioServer {
    pub fn new(config: &AppConfig) -> Self {
        let store = FileStore::new(config.server.storage_root.clone());
        Self::with_store(config.server.clone(), &config.transfer, store)
    }

    pub fn with_store(config: ServerConfig, transfer: &TransferConfig, store: FileStore) -> Self {
        Self {
            config,
            handler: Arc::new(Handler {
                store,
                encoder: TransferEncoder::from_config(transfer),
            }),
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.handler.store
    }

    /// Bind the configured address and serve forever
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.listen_address()).await?;
        self.serve_with_shutdown(listener, shutdown).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serve until `shutdown` resolves; running transfers are left to finish
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            "Serving '{}' on {}",
            self.handler.store.root().display(),
            listener.local_addr()?
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => tracing::warn!("Failed to accept connection: {}", e),
                },
                _ = &mut shutdown => {
                    tracing::info!("Shutting down server");
                    return Ok(());
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
        }
        let handler = self.handler.clone();
        let span = tracing::info_span!("connection", %peer);

        tokio::spawn(
            async move {
                tracing::debug!("Accepted connection");
                match handler.handle_connection(FramedStream::new(stream)).await {
                    Ok(()) => tracing::debug!("Connection closed"),
                    Err(e) => tracing::warn!("Connection ended with error: {}", e),
                }
            }
            .instrument(span),
        );
    }
}

impl Handler {
    async fn handle_connection(&self, mut framed: FramedStream<TcpStream>) -> Result<()> {
        while let Some(frame) = framed.read().await? {
            match frame {
                Frame::ListRequest { directory } => {
                    self.handle_list(&directory, &mut framed).await?
                }
                Frame::DownloadRequest { name } => {
                    let span =
                        tracing::info_span!("download", transfer = %Uuid::new_v4(), file = %name);
                    self.handle_download(&name, &mut framed)
                        .instrument(span)
                        .await?
                }
                other => {
                    tracing::warn!("Unexpected {} frame from client", other.kind());
                    framed
                        .write(&Frame::Error {
                            message: format!("unexpected {} frame", other.kind()),
                        })
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn handle_list(
        &self,
        directory: &str,
        framed: &mut FramedStream<TcpStream>,
    ) -> std::result::Result<(), TransportError> {
        let response = match self.store.list(directory).await {
            Ok(entries) => {
                tracing::debug!("Listing '{}': {} files", directory, entries.len());
                Frame::Listing { entries }
            }
            Err(e) => {
                tracing::error!("Listing '{}' failed: {}", directory, e);
                Frame::Error {
                    message: e.to_string(),
                }
            }
        };
        framed.write(&response).await
    }

    /// Stream one file. A missing or invalid file ends the stream without
    /// metadata.
    async fn handle_download(
        &self,
        name: &str,
        framed: &mut FramedStream<TcpStream>,
    ) -> std::result::Result<(), ProtocolError> {
        let container = match self.store.load_container(name).await {
            Ok(container) => container,
            Err(e) => {
                tracing::error!("File '{}' not available for download: {}", name, e);
                return Ok(framed.finish().await?);
            }
        };

        let report = container.validate();
        if !report.is_valid() {
            tracing::error!("Aborting because '{}' is not valid: {}", name, report);
            return Ok(framed.finish().await?);
        }

        self.encoder.send(&container, framed).await?;
        Ok(())
    }
}
