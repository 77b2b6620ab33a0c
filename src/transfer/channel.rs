//! Message channel seam for transfers
//!
//! The encoder writes to a [`MessageSink`] and the decoder reads from a
//! [`MessageSource`]. An orderly end of stream (`Ok(None)`) is distinct from
//! a transport failure (`Err`); a channel that simply disappears is a
//! failure, never an end.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::protocol::{Frame, FramedStream, StreamMessage};

/// Sending half of a transfer channel
#[async_trait]
pub trait MessageSink: Send {
    async fn send(&mut self, message: StreamMessage) -> Result<(), TransportError>;

    /// Signal the orderly end of the stream
    async fn finish(&mut self) -> Result<(), TransportError>;
}

/// Receiving half of a transfer channel
#[async_trait]
pub trait MessageSource: Send {
    /// Next message, or `Ok(None)` once the sender finished
    async fn recv(&mut self) -> Result<Option<StreamMessage>, TransportError>;
}

#[async_trait]
impl<S> MessageSink for FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: StreamMessage) -> Result<(), TransportError> {
        self.write(&Frame::from(message)).await
    }

    async fn finish(&mut self) -> Result<(), TransportError> {
        self.write(&Frame::EndOfStream).await
    }
}

#[async_trait]
impl<S> MessageSource for FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Option<StreamMessage>, TransportError> {
        match self.read().await? {
            Some(Frame::Metadata(metadata)) => Ok(Some(StreamMessage::Metadata(metadata))),
            Some(Frame::Chunk(chunk)) => Ok(Some(StreamMessage::Chunk(chunk))),
            Some(Frame::EndOfStream) => Ok(None),
            Some(Frame::Error { message }) => {
                Err(TransportError::Malformed(format!("server error: {}", message)))
            }
            Some(other) => Err(TransportError::Malformed(format!(
                "unexpected {} frame in transfer",
                other.kind()
            ))),
            // EOF without EndOfStream
            None => Err(TransportError::Closed),
        }
    }
}

enum Signal {
    Message(StreamMessage),
    End,
    Fail(String),
}

/// Create an in-process channel holding at most `capacity` pending messages
pub fn memory_channel(capacity: usize) -> (MemorySink, MemorySource) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (MemorySink { tx }, MemorySource { rx })
}

/// Sending half of [`memory_channel`]
pub struct MemorySink {
    tx: mpsc::Sender<Signal>,
}

impl MemorySink {
    /// Make the receiver observe a transport failure
    pub async fn abort(&mut self, reason: impl Into<String>) -> Result<(), TransportError> {
        self.tx
            .send(Signal::Fail(reason.into()))
            .await
            .map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl MessageSink for MemorySink {
    async fn send(&mut self, message: StreamMessage) -> Result<(), TransportError> {
        self.tx
            .send(Signal::Message(message))
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn finish(&mut self) -> Result<(), TransportError> {
        self.tx
            .send(Signal::End)
            .await
            .map_err(|_| TransportError::Closed)
    }
}

/// Receiving half of [`memory_channel`]
pub struct MemorySource {
    rx: mpsc::Receiver<Signal>,
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn recv(&mut self) -> Result<Option<StreamMessage>, TransportError> {
        match self.rx.recv().await {
            Some(Signal::Message(message)) => Ok(Some(message)),
            Some(Signal::End) => Ok(None),
            Some(Signal::Fail(reason)) => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                reason,
            ))),
            None => Err(TransportError::Closed),
        }
    }
}
