//! Receiver side of a file transfer
//!
//! ```text
//! AwaitingMetadata --metadata--> ReceivingChunks --end--> Complete
//!        |                              |
//!        +--------- failure ------------+-----------> Failed
//! ```
//!
//! Only `Complete` yields a container. `Failed` is terminal.

use crate::config::TransferConfig;
use crate::constants::MAX_FRAGMENT_SIZE;
use crate::error::{ProtocolError, TransportError};
use crate::protocol::{StreamChunk, StreamMessage, StreamMetadata};
use crate::transfer::channel::MessageSource;
use crate::wav::WavContainer;

/// Where a decoder is in its transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    AwaitingMetadata,
    ReceivingChunks,
    Complete,
    Failed,
}

/// Upper bound on the buffer reserved up front; the rest grows with the data
const INITIAL_CAPACITY: usize = 1024 * 1024;

/// Payload being filled in for the current transfer
struct Reassembly {
    metadata: StreamMetadata,
    buffer: Vec<u8>,
    fragments: usize,
}

impl Reassembly {
    fn new(metadata: StreamMetadata) -> Self {
        let declared = metadata.payload_size as usize;
        Self {
            metadata,
            buffer: Vec::with_capacity(declared.min(INITIAL_CAPACITY)),
            fragments: 0,
        }
    }

    /// Append `chunk`, never growing past the declared size
    fn append(&mut self, chunk: &StreamChunk) {
        let room = self.metadata.payload_size as usize - self.buffer.len();
        let take = room.min(chunk.len());
        self.buffer.extend_from_slice(&chunk.data[..take]);
        self.fragments += 1;
    }
}

/// Reassembles a container from a metadata message and payload fragments
pub struct TransferDecoder {
    state: DecoderState,
    reassembly: Option<Reassembly>,
    /// Every payload byte received, including any beyond the declared size
    received: u64,
    max_fragment_size: usize,
    strict_length: bool,
}

impl TransferDecoder {
    pub fn new(max_fragment_size: usize, strict_length: bool) -> Self {
        Self {
            state: DecoderState::AwaitingMetadata,
            reassembly: None,
            received: 0,
            max_fragment_size,
            strict_length,
        }
    }

    pub fn from_config(config: &TransferConfig) -> Self {
        Self::new(config.max_fragment_size, config.strict_length)
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Payload bytes received so far, also after the transfer finished
    pub fn bytes_received(&self) -> u64 {
        self.received
    }

    /// Feed the next message of the stream
    pub fn on_message(&mut self, message: StreamMessage) -> Result<(), ProtocolError> {
        match (self.state, message) {
            (DecoderState::AwaitingMetadata, StreamMessage::Metadata(metadata)) => {
                tracing::info!(
                    "Metadata: {}ch {}Hz {}bps, {} payload bytes",
                    metadata.channels,
                    metadata.sample_rate,
                    metadata.bits_per_sample,
                    metadata.payload_size
                );
                self.reassembly = Some(Reassembly::new(metadata));
                self.state = DecoderState::ReceivingChunks;
                Ok(())
            }
            (DecoderState::AwaitingMetadata, StreamMessage::Chunk(_)) => {
                self.fail(ProtocolError::UnexpectedMessage("chunk before metadata"))
            }
            (DecoderState::ReceivingChunks, StreamMessage::Chunk(chunk)) => {
                if chunk.len() > self.max_fragment_size {
                    return self.fail(ProtocolError::OversizedFragment {
                        len: chunk.len(),
                        max: self.max_fragment_size,
                    });
                }
                if let Some(reassembly) = self.reassembly.as_mut() {
                    reassembly.append(&chunk);
                }
                self.received += chunk.len() as u64;
                Ok(())
            }
            (DecoderState::ReceivingChunks, StreamMessage::Metadata(_)) => {
                self.fail(ProtocolError::UnexpectedMessage("second metadata"))
            }
            (DecoderState::Complete | DecoderState::Failed, _) => Err(
                ProtocolError::UnexpectedMessage("message after transfer finished"),
            ),
        }
    }

    /// The sender signalled end of stream
    pub fn on_end(&mut self) -> Result<WavContainer, ProtocolError> {
        match self.state {
            DecoderState::AwaitingMetadata => self.fail(ProtocolError::NoMetadata),
            DecoderState::ReceivingChunks => {
                let Some(reassembly) = self.reassembly.take() else {
                    return self.fail(ProtocolError::NoMetadata);
                };
                let declared = reassembly.metadata.payload_size;

                if self.received != declared as u64 {
                    tracing::warn!(
                        "Read {} bytes, but raw data size is {}",
                        self.received,
                        declared
                    );
                    if self.strict_length {
                        return self.fail(ProtocolError::LengthMismatch {
                            declared,
                            received: self.received,
                        });
                    }
                }

                // A short payload keeps the declared size so validation flags it
                let format = reassembly.metadata.format_descriptor();
                match WavContainer::construct_with_len(format, reassembly.buffer, declared) {
                    Ok(container) => {
                        self.state = DecoderState::Complete;
                        tracing::debug!(
                            "Reassembled {} bytes from {} fragments",
                            container.payload_len(),
                            reassembly.fragments
                        );
                        Ok(container)
                    }
                    Err(e) => self.fail(e.into()),
                }
            }
            DecoderState::Complete | DecoderState::Failed => Err(
                ProtocolError::UnexpectedMessage("end after transfer finished"),
            ),
        }
    }

    /// The channel broke; the transfer is abandoned
    pub fn on_transport_error(&mut self, error: TransportError) -> ProtocolError {
        tracing::error!("Transfer failed in state {:?}: {}", self.state, error);
        self.state = DecoderState::Failed;
        self.reassembly = None;
        ProtocolError::TransportFailure(error)
    }

    /// Drive the decoder from `source` until the stream ends or fails
    pub async fn receive<S>(&mut self, source: &mut S) -> Result<WavContainer, ProtocolError>
    where
        S: MessageSource + ?Sized,
    {
        loop {
            match source.recv().await {
                Ok(Some(message)) => self.on_message(message)?,
                Ok(None) => return self.on_end(),
                Err(e) => return Err(self.on_transport_error(e)),
            }
        }
    }

    fn fail<T>(&mut self, error: ProtocolError) -> Result<T, ProtocolError> {
        self.state = DecoderState::Failed;
        self.reassembly = None;
        Err(error)
    }
}

impl Default for TransferDecoder {
    fn default() -> Self {
        Self::new(MAX_FRAGMENT_SIZE, false)
    }
}
