//! Fixed-size chunk headers of the RIFF/WAVE container
//!
//! All multi-byte integers are little-endian. Byte layout:
//!
//! ```text
//! offset  size  field
//!      0     4  "RIFF"
//!      4     4  total size (everything after this field)
//!      8     4  "WAVE"
//!     12     4  "fmt "
//!     16     4  format chunk size (16 for PCM)
//!     20     2  format tag (1 = PCM)
//!     22     2  channels
//!     24     4  sample rate
//!     28     4  byte rate
//!     32     2  block align
//!     34     2  bits per sample
//!     36     4  "data"
//!     40     4  payload size
//!     44     N  payload
//! ```

use bytes::{Buf, BufMut};

use crate::error::FormatError;

/// Four-character chunk identifier
pub type FourCC = [u8; 4];

/// Magic literals of the container
pub mod magic {
    use super::FourCC;

    pub const RIFF: FourCC = *b"RIFF";
    pub const WAVE: FourCC = *b"WAVE";
    pub const FMT: FourCC = *b"fmt ";
    pub const DATA: FourCC = *b"data";
}

/// Size of the outer RIFF header
pub const RIFF_HEADER_LEN: usize = 12;

/// Size of the format chunk including its id and size fields
pub const FORMAT_CHUNK_LEN: usize = 24;

/// Id and size fields that precede every sub-chunk body
pub const CHUNK_HEADER_LEN: usize = 8;

/// Size of the data chunk id and size fields
pub const DATA_HEADER_LEN: usize = CHUNK_HEADER_LEN;

/// Bytes preceding the payload
pub const HEADER_LEN: usize = RIFF_HEADER_LEN + FORMAT_CHUNK_LEN + DATA_HEADER_LEN;

/// Format tag for linear PCM
pub const PCM_FORMAT_TAG: u16 = 1;

/// Declared size of an uncompressed PCM format chunk
pub const PCM_FORMAT_CHUNK_SIZE: u32 = 16;

/// Fail with `Truncated` unless `buf` holds at least `needed` bytes
pub(crate) fn ensure_remaining<B: Buf>(
    buf: &B,
    region: &'static str,
    needed: usize,
) -> Result<(), FormatError> {
    let available = buf.remaining();
    if available < needed {
        return Err(FormatError::Truncated {
            region,
            needed,
            available,
        });
    }
    Ok(())
}

fn get_fourcc<B: Buf>(buf: &mut B) -> FourCC {
    let mut id = [0u8; 4];
    buf.copy_to_slice(&mut id);
    id
}

/// Outer RIFF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    pub id: FourCC,
    /// Byte count following this field
    pub total_size: u32,
    pub format: FourCC,
}

impl RiffHeader {
    pub fn new(total_size: u32) -> Self {
        Self {
            id: magic::RIFF,
            total_size,
            format: magic::WAVE,
        }
    }

    /// Both literals match "RIFF" and "WAVE"
    pub fn magic_valid(&self) -> bool {
        self.id == magic::RIFF && self.format == magic::WAVE
    }

    pub(crate) fn read<B: Buf>(buf: &mut B) -> Result<Self, FormatError> {
        ensure_remaining(buf, "RIFF header", RIFF_HEADER_LEN)?;
        Ok(Self {
            id: get_fourcc(buf),
            total_size: buf.get_u32_le(),
            format: get_fourcc(buf),
        })
    }

    pub(crate) fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.id);
        buf.put_u32_le(self.total_size);
        buf.put_slice(&self.format);
    }
}

/// The "fmt " chunk describing the sample layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub id: FourCC,
    pub chunk_size: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatDescriptor {
    /// Build a PCM descriptor with consistent byte rate and block alignment
    ///
    /// Rates that do not fit their fields saturate, so such a descriptor
    /// fails [`FormatDescriptor::byte_rate_valid`] or
    /// [`FormatDescriptor::block_align_valid`] instead of wrapping.
    pub fn pcm(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        let mut format = Self {
            id: magic::FMT,
            chunk_size: PCM_FORMAT_CHUNK_SIZE,
            format_tag: PCM_FORMAT_TAG,
            channels,
            sample_rate,
            byte_rate: 0,
            block_align: 0,
            bits_per_sample,
        };
        format.byte_rate = u32::try_from(format.expected_byte_rate()).unwrap_or(u32::MAX);
        format.block_align = u16::try_from(format.expected_block_align()).unwrap_or(u16::MAX);
        format
    }

    /// `sample_rate * channels * bits_per_sample / 8`
    pub fn expected_byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64 * self.bits_per_sample as u64 / 8
    }

    /// `channels * bits_per_sample / 8`
    pub fn expected_block_align(&self) -> u64 {
        self.channels as u64 * self.bits_per_sample as u64 / 8
    }

    pub fn magic_valid(&self) -> bool {
        self.id == magic::FMT
    }

    pub fn byte_rate_valid(&self) -> bool {
        self.byte_rate as u64 == self.expected_byte_rate()
    }

    pub fn block_align_valid(&self) -> bool {
        self.block_align as u64 == self.expected_block_align()
    }

    /// Uncompressed linear PCM with the canonical 16-byte chunk
    pub fn is_pcm(&self) -> bool {
        self.format_tag == PCM_FORMAT_TAG && self.chunk_size == PCM_FORMAT_CHUNK_SIZE
    }

    pub(crate) fn read<B: Buf>(buf: &mut B) -> Result<Self, FormatError> {
        ensure_remaining(buf, "format chunk", FORMAT_CHUNK_LEN)?;
        Ok(Self {
            id: get_fourcc(buf),
            chunk_size: buf.get_u32_le(),
            format_tag: buf.get_u16_le(),
            channels: buf.get_u16_le(),
            sample_rate: buf.get_u32_le(),
            byte_rate: buf.get_u32_le(),
            block_align: buf.get_u16_le(),
            bits_per_sample: buf.get_u16_le(),
        })
    }

    pub(crate) fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.id);
        buf.put_u32_le(self.chunk_size);
        buf.put_u16_le(self.format_tag);
        buf.put_u16_le(self.channels);
        buf.put_u32_le(self.sample_rate);
        buf.put_u32_le(self.byte_rate);
        buf.put_u16_le(self.block_align);
        buf.put_u16_le(self.bits_per_sample);
    }
}

/// Id and declared size of the "data" chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub id: FourCC,
    pub size: u32,
}

impl DataHeader {
    pub fn new(size: u32) -> Self {
        Self {
            id: magic::DATA,
            size,
        }
    }

    pub fn magic_valid(&self) -> bool {
        self.id == magic::DATA
    }

    pub(crate) fn read<B: Buf>(buf: &mut B) -> Result<Self, FormatError> {
        ensure_remaining(buf, "data chunk header", DATA_HEADER_LEN)?;
        Ok(Self {
            id: get_fourcc(buf),
            size: buf.get_u32_le(),
        })
    }

    pub(crate) fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.id);
        buf.put_u32_le(self.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_descriptor_derives_rates() {
        let format = FormatDescriptor::pcm(1, 8000, 16);
        assert_eq!(format.byte_rate, 16000);
        assert_eq!(format.block_align, 2);
        assert!(format.magic_valid());
        assert!(format.byte_rate_valid());
        assert!(format.block_align_valid());
        assert!(format.is_pcm());
    }

    #[test]
    fn test_format_layout_is_24_bytes() {
        let format = FormatDescriptor::pcm(2, 44100, 16);
        let mut buf = Vec::new();
        format.write(&mut buf);

        assert_eq!(buf.len(), FORMAT_CHUNK_LEN);
        assert_eq!(&buf[0..4], b"fmt ");
        assert_eq!(&buf[4..8], &16u32.to_le_bytes());
        assert_eq!(&buf[12..16], &44100u32.to_le_bytes());
        assert_eq!(&buf[16..20], &176400u32.to_le_bytes());

        let parsed = FormatDescriptor::read(&mut buf.as_slice()).unwrap();
        assert_eq!(parsed, format);
    }

    #[test]
    fn test_short_riff_header_is_truncated() {
        let bytes = b"RIFF\x00\x00";
        let err = RiffHeader::read(&mut &bytes[..]).unwrap_err();
        assert_eq!(
            err,
            FormatError::Truncated {
                region: "RIFF header",
                needed: RIFF_HEADER_LEN,
                available: 6,
            }
        );
    }

    #[test]
    fn test_rate_arithmetic_does_not_overflow() {
        let mut format = FormatDescriptor::pcm(u16::MAX, u32::MAX, 32);
        format.byte_rate = 0;
        assert!(!format.byte_rate_valid());
        assert_eq!(
            format.expected_byte_rate(),
            u32::MAX as u64 * u16::MAX as u64 * 4
        );
    }

    #[test]
    fn test_unrepresentable_rates_saturate() {
        let format = FormatDescriptor::pcm(u16::MAX, u32::MAX, 32);
        assert_eq!(format.byte_rate, u32::MAX);
        assert_eq!(format.block_align, u16::MAX);
        assert!(!format.byte_rate_valid());
        assert!(!format.block_align_valid());
    }
}
