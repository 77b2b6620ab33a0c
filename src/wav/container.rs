//! In-memory WAV container: decode, validate, encode, construct

use std::fmt;
use std::time::Duration;

use super::chunk::{
    ensure_remaining, DataHeader, FormatDescriptor, RiffHeader, CHUNK_HEADER_LEN, HEADER_LEN,
};
use crate::error::FormatError;

/// A RIFF/WAVE file held in memory
///
/// The container exclusively owns its payload. Decoding and construction
/// never judge validity; call [`WavContainer::validate`] for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    pub riff: RiffHeader,
    pub format: FormatDescriptor,
    pub data: DataHeader,
    payload: Vec<u8>,
}

impl WavContainer {
    /// Parse a container from raw bytes
    ///
    /// Fails only when a region is shorter than it must be. Bytes after the
    /// declared payload are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut buf = bytes;

        let riff = RiffHeader::read(&mut buf)?;
        let format = FormatDescriptor::read(&mut buf)?;
        let data = DataHeader::read(&mut buf)?;

        ensure_remaining(&buf, "data payload", data.size as usize)?;
        let payload = buf[..data.size as usize].to_vec();

        Ok(Self {
            riff,
            format,
            data,
            payload,
        })
    }

    /// Assemble a container from a format descriptor and an owned payload
    ///
    /// Fills in the RIFF, WAVE and data ids and derives the RIFF total size
    /// from the two sub-chunk sizes.
    pub fn construct(format: FormatDescriptor, payload: Vec<u8>) -> Result<Self, FormatError> {
        let size =
            u32::try_from(payload.len()).map_err(|_| FormatError::PayloadTooLarge(payload.len()))?;
        Self::construct_with_len(format, payload, size)
    }

    /// Like [`WavContainer::construct`], but the data chunk declares
    /// `declared` bytes whatever the payload actually holds
    ///
    /// A payload of any other length yields a container that fails the
    /// payload length check of [`WavContainer::validate`].
    pub fn construct_with_len(
        format: FormatDescriptor,
        payload: Vec<u8>,
        declared: u32,
    ) -> Result<Self, FormatError> {
        let data = DataHeader::new(declared);
        let total_size = expected_total_size(&format, &data);
        let total_size = u32::try_from(total_size)
            .map_err(|_| FormatError::PayloadTooLarge(declared as usize))?;

        Ok(Self {
            riff: RiffHeader::new(total_size),
            format,
            data,
            payload,
        })
    }

    /// Serialize to the on-disk byte layout
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.riff.write(&mut buf);
        self.format.write(&mut buf);
        self.data.write(&mut buf);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Length of [`WavContainer::encode`] output
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Whole-file size according to the RIFF header
    pub fn size_in_bytes(&self) -> u64 {
        self.riff.total_size as u64 + 8
    }

    /// Run every structural and arithmetic check
    pub fn validate(&self) -> ValidationReport {
        ValidationReport {
            riff_magic: self.riff.magic_valid(),
            format_magic: self.format.magic_valid(),
            data_magic: self.data.magic_valid(),
            byte_rate: self.format.byte_rate_valid(),
            block_align: self.format.block_align_valid(),
            total_size: self.riff.total_size as u64
                == expected_total_size(&self.format, &self.data),
            payload_length: self.payload.len() as u64 == self.data.size as u64,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    /// Raw sample bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Give up the container, keeping its payload
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Playing time of the payload, if the byte rate is usable
    pub fn duration(&self) -> Option<Duration> {
        if self.format.byte_rate == 0 {
            return None;
        }
        let millis = self.payload.len() as u64 * 1000 / self.format.byte_rate as u64;
        Some(Duration::from_millis(millis))
    }
}

/// `4 + (8 + format chunk size) + (8 + data chunk size)`
fn expected_total_size(format: &FormatDescriptor, data: &DataHeader) -> u64 {
    4 + (CHUNK_HEADER_LEN as u64 + format.chunk_size as u64)
        + (CHUNK_HEADER_LEN as u64 + data.size as u64)
}

/// Outcome of [`WavContainer::validate`], one flag per check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    /// "RIFF" and "WAVE" literals
    pub riff_magic: bool,
    pub format_magic: bool,
    pub data_magic: bool,
    pub byte_rate: bool,
    pub block_align: bool,
    /// RIFF total size matches the sub-chunk sizes
    pub total_size: bool,
    /// Payload buffer holds exactly the declared size
    pub payload_length: bool,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures().is_empty()
    }

    /// Names of the checks that failed
    pub fn failures(&self) -> Vec<&'static str> {
        [
            (self.riff_magic, "riff magic"),
            (self.format_magic, "format magic"),
            (self.data_magic, "data magic"),
            (self.byte_rate, "byte rate"),
            (self.block_align, "block align"),
            (self.total_size, "total size"),
            (self.payload_length, "payload length"),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, name)| name)
        .collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failures = self.failures();
        if failures.is_empty() {
            write!(f, "valid")
        } else {
            write!(f, "failed checks: {}", failures.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::chunk::{magic, FORMAT_CHUNK_LEN, RIFF_HEADER_LEN};
    use proptest::prelude::*;

    fn sample_container(payload_len: usize) -> WavContainer {
        let payload = (0..payload_len).map(|i| (i % 251) as u8).collect();
        WavContainer::construct(FormatDescriptor::pcm(2, 44100, 16), payload).unwrap()
    }

    #[test]
    fn test_constructed_container_is_valid() {
        let container = sample_container(1000);
        let report = container.validate();
        assert!(report.is_valid(), "{}", report);
        assert_eq!(container.riff.total_size, 4 + 24 + 8 + 1000);
        assert_eq!(container.size_in_bytes(), 1044);
    }

    #[test]
    fn test_encode_layout() {
        let container = sample_container(10);
        let bytes = container.encode();

        assert_eq!(bytes.len(), 54);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[4..8], &46u32.to_le_bytes());
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(&bytes[40..44], &10u32.to_le_bytes());
        assert_eq!(&bytes[44..], container.payload());
    }

    #[test]
    fn test_decode_rejects_short_buffers() {
        let bytes = sample_container(0).encode();
        for len in [0, RIFF_HEADER_LEN - 1, RIFF_HEADER_LEN + FORMAT_CHUNK_LEN, HEADER_LEN - 1] {
            let err = WavContainer::decode(&bytes[..len]).unwrap_err();
            assert!(matches!(err, FormatError::Truncated { .. }), "len {}", len);
        }
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        let bytes = sample_container(100).encode();
        let err = WavContainer::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(
            err,
            FormatError::Truncated {
                region: "data payload",
                needed: 100,
                available: 99,
            }
        );
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let container = sample_container(16);
        let mut bytes = container.encode();
        bytes.extend_from_slice(b"LIST");
        assert_eq!(WavContainer::decode(&bytes).unwrap(), container);
    }

    #[test]
    fn test_decode_keeps_malformed_but_complete_input() {
        let mut bytes = sample_container(8).encode();
        bytes[0..4].copy_from_slice(b"RIFX");
        bytes[36..40].copy_from_slice(b"junk");

        let container = WavContainer::decode(&bytes).unwrap();
        let report = container.validate();
        assert!(!report.riff_magic);
        assert!(!report.data_magic);
        assert!(report.format_magic);
        assert!(report.byte_rate);
        assert_eq!(report.failures(), vec!["riff magic", "data magic"]);
    }

    #[test]
    fn test_each_corrupted_magic_fails_validation() {
        let base = sample_container(32);

        let mut c = base.clone();
        c.riff.id = *b"RIFX";
        assert!(!c.is_valid());

        let mut c = base.clone();
        c.riff.format = *b"AVI ";
        assert!(!c.is_valid());

        let mut c = base.clone();
        c.format.id = *b"fmt\0";
        assert!(!c.is_valid());

        let mut c = base;
        c.data.id = *b"DATA";
        assert!(!c.is_valid());
    }

    #[test]
    fn test_byte_rate_mismatch_fails_validation() {
        let mut format = FormatDescriptor::pcm(1, 8000, 16);
        assert_eq!(format.byte_rate, 16000);
        assert_eq!(format.block_align, 2);

        format.byte_rate = 15999;
        let container = WavContainer::construct(format, vec![0; 64]).unwrap();
        let report = container.validate();
        assert!(!report.is_valid());
        assert!(!report.byte_rate);
        assert!(report.block_align);
        assert!(report.total_size);
    }

    #[test]
    fn test_block_align_mismatch_fails_validation() {
        let mut container = sample_container(4);
        container.format.block_align = 3;
        assert_eq!(container.validate().failures(), vec!["block align"]);
    }

    #[test]
    fn test_total_size_mismatch_fails_validation() {
        let mut container = sample_container(4);
        container.riff.total_size += 1;
        assert_eq!(container.validate().failures(), vec!["total size"]);
    }

    #[test]
    fn test_short_payload_with_declared_len_fails_validation() {
        let format = FormatDescriptor::pcm(2, 44100, 16);
        let container = WavContainer::construct_with_len(format, vec![7; 5120], 30000).unwrap();

        assert_eq!(container.data.size, 30000);
        assert_eq!(container.payload_len(), 5120);
        assert_eq!(container.validate().failures(), vec!["payload length"]);
    }

    #[test]
    fn test_construct_fills_ids() {
        let container = sample_container(2);
        assert_eq!(container.riff.id, magic::RIFF);
        assert_eq!(container.riff.format, magic::WAVE);
        assert_eq!(container.data.id, magic::DATA);
        assert_eq!(container.data.size, 2);
    }

    #[test]
    fn test_duration() {
        let container = WavContainer::construct(FormatDescriptor::pcm(1, 8000, 16), vec![0; 32000])
            .unwrap();
        assert_eq!(container.duration(), Some(Duration::from_secs(2)));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            channels in 1u16..=8,
            sample_rate in prop::sample::select(vec![8000u32, 22050, 44100, 48000, 96000]),
            bits in prop::sample::select(vec![8u16, 16, 24, 32]),
            payload in prop::collection::vec(any::<u8>(), 0..2048),
        ) {
            let container =
                WavContainer::construct(FormatDescriptor::pcm(channels, sample_rate, bits), payload)
                    .unwrap();
            let bytes = container.encode();

            prop_assert_eq!(bytes.len() as u64, container.riff.total_size as u64 + 8);
            let decoded = WavContainer::decode(&bytes).unwrap();
            prop_assert!(decoded.is_valid());
            prop_assert_eq!(decoded.encode(), bytes);
            prop_assert_eq!(decoded, container);
        }
    }
}
