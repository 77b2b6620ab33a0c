//! Sender side of a file transfer
//!
//! Emits one metadata message, then the payload in consecutive fragments of
//! at most `max_fragment_size` bytes, then an end-of-stream signal.

use crate::config::TransferConfig;
use crate::error::ProtocolError;
use crate::protocol::{StreamChunk, StreamMessage, StreamMetadata};
use crate::transfer::channel::MessageSink;
use crate::wav::WavContainer;

/// What a completed send put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSummary {
    pub fragments: usize,
    pub bytes: u64,
}

/// Splits containers into a metadata message and payload fragments
#[derive(Debug, Clone)]
pub struct TransferEncoder {
    max_fragment_size: usize,
}

impl TransferEncoder {
    pub fn new(max_fragment_size: usize) -> Self {
        Self {
            max_fragment_size: max_fragment_size.max(1),
        }
    }

    pub fn from_config(config: &TransferConfig) -> Self {
        Self::new(config.max_fragment_size)
    }

    pub fn max_fragment_size(&self) -> usize {
        self.max_fragment_size
    }

    /// Number of fragments a payload of `len` bytes is split into
    pub fn fragment_count(&self, len: usize) -> usize {
        len.div_ceil(self.max_fragment_size)
    }

    /// Stream `container` into `sink`
    ///
    /// Stops at the first failed write and returns it; nothing is retried.
    /// Only one fragment is held in memory at a time.
    pub async fn send<S>(
        &self,
        container: &WavContainer,
        sink: &mut S,
    ) -> Result<TransferSummary, ProtocolError>
    where
        S: MessageSink + ?Sized,
    {
        let metadata = StreamMetadata::from_container(container);
        if let Err(e) = sink.send(StreamMessage::Metadata(metadata)).await {
            tracing::error!("Sending metadata failed: {}", e);
            return Err(e.into());
        }

        let payload = container.payload();
        let mut summary = TransferSummary {
            fragments: 0,
            bytes: 0,
        };

        for fragment in payload.chunks(self.max_fragment_size) {
            let chunk = StreamChunk::new(fragment.to_vec());
            if let Err(e) = sink.send(StreamMessage::Chunk(chunk)).await {
                tracing::error!(
                    "Failed to write fragment {} after {} bytes: {}",
                    summary.fragments,
                    summary.bytes,
                    e
                );
                return Err(e.into());
            }
            summary.fragments += 1;
            summary.bytes += fragment.len() as u64;
        }

        sink.finish().await?;

        tracing::info!(
            "Sent {}/{} bytes in {} fragments",
            summary.bytes,
            payload.len(),
            summary.fragments
        );
        Ok(summary)
    }
}

impl Default for TransferEncoder {
    fn default() -> Self {
        Self::new(crate::constants::MAX_FRAGMENT_SIZE)
    }
}
