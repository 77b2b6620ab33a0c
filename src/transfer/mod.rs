//! Chunked streaming transfer of containers
//!
//! The encoder turns a container into one [`StreamMessage::Metadata`] and an
//! ordered run of [`StreamMessage::Chunk`]s; the decoder puts them back
//! together. Each transfer owns its channel and payload buffer, so any
//! number of transfers can run concurrently.
//!
//! [`StreamMessage::Metadata`]: crate::protocol::StreamMessage::Metadata
//! [`StreamMessage::Chunk`]: crate::protocol::StreamMessage::Chunk

pub mod channel;
pub mod decoder;
pub mod encoder;

pub use channel::{memory_channel, MemorySink, MemorySource, MessageSink, MessageSource};
pub use decoder::{DecoderState, TransferDecoder};
pub use encoder::{TransferEncoder, TransferSummary};
