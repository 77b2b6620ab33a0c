//! RIFF/WAVE container codec
//!
//! Byte-exact parsing and serialization of uncompressed PCM WAV files,
//! plus the structural and arithmetic checks that decide whether a parsed
//! container is usable.

pub mod chunk;
pub mod container;

pub use chunk::{magic, DataHeader, FormatDescriptor, FourCC, RiffHeader, HEADER_LEN};
pub use container::{ValidationReport, WavContainer};
