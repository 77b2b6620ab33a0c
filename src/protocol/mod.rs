//! Wire protocol between storage node and clients
//!
//! Every message is a [`Frame`], sent as a 4-byte little-endian length
//! followed by its bincode encoding. A download is answered by exactly one
//! [`Frame::Metadata`], zero or more [`Frame::Chunk`] and a closing
//! [`Frame::EndOfStream`].

pub mod framing;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wav::{FormatDescriptor, WavContainer};

pub use framing::{read_frame, write_frame, FramedStream, MAX_FRAME_SIZE};

/// Format fields and payload length, sent once per transfer before any chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Total payload bytes that will follow in chunks
    pub payload_size: u32,
}

impl StreamMetadata {
    pub fn from_container(container: &WavContainer) -> Self {
        let format = &container.format;
        Self {
            channels: format.channels,
            sample_rate: format.sample_rate,
            byte_rate: format.byte_rate,
            block_align: format.block_align,
            bits_per_sample: format.bits_per_sample,
            payload_size: container.data.size,
        }
    }

    /// Rebuild a PCM format descriptor, keeping the sender's rates verbatim
    pub fn format_descriptor(&self) -> FormatDescriptor {
        FormatDescriptor {
            channels: self.channels,
            sample_rate: self.sample_rate,
            byte_rate: self.byte_rate,
            block_align: self.block_align,
            bits_per_sample: self.bits_per_sample,
            ..FormatDescriptor::pcm(self.channels, self.sample_rate, self.bits_per_sample)
        }
    }
}

/// One ordered fragment of payload bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub data: Bytes,
}

impl StreamChunk {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The two message shapes of a streaming transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    Metadata(StreamMetadata),
    Chunk(StreamChunk),
}

/// Catalog entry for one stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Everything that travels over a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// Client asks for the `.wav` files in a directory
    ListRequest { directory: String },
    /// Server answer to `ListRequest`
    Listing { entries: Vec<FileEntry> },
    /// Client asks for a file by name
    DownloadRequest { name: String },
    Metadata(StreamMetadata),
    Chunk(StreamChunk),
    /// Orderly end of a download stream
    EndOfStream,
    /// Request-level failure reported by the server
    Error { message: String },
}

impl From<StreamMessage> for Frame {
    fn from(message: StreamMessage) -> Self {
        match message {
            StreamMessage::Metadata(metadata) => Frame::Metadata(metadata),
            StreamMessage::Chunk(chunk) => Frame::Chunk(chunk),
        }
    }
}

impl Frame {
    /// Short name for logs and protocol errors
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::ListRequest { .. } => "list request",
            Frame::Listing { .. } => "listing",
            Frame::DownloadRequest { .. } => "download request",
            Frame::Metadata(_) => "metadata",
            Frame::Chunk(_) => "chunk",
            Frame::EndOfStream => "end of stream",
            Frame::Error { .. } => "error",
        }
    }
}
