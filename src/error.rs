//! Error types for the WAV transfer library

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Container bytes that cannot be parsed at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Truncated {region}: needed {needed} bytes, {available} available")]
    Truncated {
        region: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Payload of {0} bytes does not fit a 32-bit chunk size")]
    PayloadTooLarge(usize),
}

/// Stream-level failures of a single transfer
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Stream ended before any metadata arrived")]
    NoMetadata,

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    #[error("Unexpected message: {0}")]
    UnexpectedMessage(&'static str),

    #[error("Fragment of {len} bytes exceeds the {max} byte maximum")]
    OversizedFragment { len: usize, max: usize },

    #[error("Received {received} payload bytes, metadata declared {declared}")]
    LengthMismatch { declared: u32, received: u64 },

    #[error("Cannot assemble container: {0}")]
    Assembly(#[from] FormatError),

    #[error("Remote error: {0}")]
    Remote(String),
}

/// Channel failures, distinct from an orderly end of stream
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Channel closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Malformed frame: {0}")]
    Malformed(String),
}

/// Storage collaborator errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path)
        } else {
            StorageError::Io { path, source }
        }
    }
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
