//! # wavlink
//!
//! Lossless transfer of PCM WAV files between a storage node and remote
//! consumers.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────── STORAGE NODE ────────────────────────────────┐
//! │                                                                               │
//! │  ┌─────────────┐    ┌─────────────────┐    ┌──────────────────────────────┐  │
//! │  │  FileStore  │───▶│  WavContainer   │───▶│  TransferEncoder             │  │
//! │  │  (storage)  │    │  decode/validate│    │  Metadata, Chunk*, End       │  │
//! │  └─────────────┘    └─────────────────┘    └──────────────┬───────────────┘  │
//! │                                                           │                  │
//! └───────────────────────────────────────────────────────────┼──────────────────┘
//!                                                             │ TCP, length-prefixed
//!                                                             │ bincode frames
//! ┌───────────────────────────────────────────────────────────┼──────────────────┐
//! │                                                           ▼                  │
//! │  ┌─────────────┐    ┌─────────────────┐    ┌──────────────────────────────┐  │
//! │  │  FileStore  │◀───│  WavContainer   │◀───│  TransferDecoder             │  │
//! │  │  or Playback│    │  construct/     │    │  AwaitingMetadata →          │  │
//! │  │  sink       │    │  validate       │    │  ReceivingChunks → Complete  │  │
//! │  └─────────────┘    └─────────────────┘    └──────────────────────────────┘  │
//! │                                                                               │
//! └──────────────────────────────────── CLIENT ──────────────────────────────────┘
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod protocol;
pub mod storage;
pub mod transfer;
pub mod wav;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Largest payload fragment carried by one chunk message
    pub const MAX_FRAGMENT_SIZE: usize = 5 * 1024;

    /// Default TCP port of the storage node
    pub const DEFAULT_PORT: u16 = 50051;

    /// Extension of files listed in the catalog
    pub const WAV_EXTENSION: &str = "wav";
}
