//! PCM payload to interleaved `f32` conversion

use crate::error::{Error, Result};
use crate::wav::FormatDescriptor;

/// Convert an interleaved PCM payload to `f32` samples in `[-1.0, 1.0)`
///
/// 8-bit data is unsigned, wider formats are signed little-endian. A trailing
/// partial sample is ignored.
pub fn to_f32_samples(format: &FormatDescriptor, payload: &[u8]) -> Result<Vec<f32>> {
    if !format.is_pcm() {
        return Err(Error::Playback(format!(
            "Unsupported format tag {} (chunk size {})",
            format.format_tag, format.chunk_size
        )));
    }

    let samples = match format.bits_per_sample {
        8 => payload
            .iter()
            .map(|&b| (b as f32 - 128.0) / 128.0)
            .collect(),
        16 => payload
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32_768.0)
            .collect(),
        24 => payload
            .chunks_exact(3)
            .map(|b| {
                // sign-extend through the top byte of an i32
                let value = i32::from_le_bytes([0, b[0], b[1], b[2]]) >> 8;
                value as f32 / 8_388_608.0
            })
            .collect(),
        32 => payload
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32 / 2_147_483_648.0)
            .collect(),
        bits => {
            return Err(Error::Playback(format!(
                "Unsupported bits per sample: {}",
                bits
            )))
        }
    };

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_16_bit() {
        let format = FormatDescriptor::pcm(1, 8000, 16);
        let payload = [0x00, 0x80, 0x00, 0x00, 0x00, 0x40, 0xff];
        let samples = to_f32_samples(&format, &payload).unwrap();
        assert_eq!(samples, vec![-1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_8_bit_is_unsigned() {
        let format = FormatDescriptor::pcm(1, 8000, 8);
        let samples = to_f32_samples(&format, &[0, 128, 192]).unwrap();
        assert_eq!(samples, vec![-1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_24_bit_sign_extension() {
        let format = FormatDescriptor::pcm(1, 8000, 24);
        let payload = [0x00, 0x00, 0x80, 0xff, 0xff, 0xff];
        let samples = to_f32_samples(&format, &payload).unwrap();
        assert_eq!(samples[0], -1.0);
        assert!(samples[1] < 0.0 && samples[1] > -0.001);
    }

    #[test]
    fn test_rejects_odd_formats() {
        let format = FormatDescriptor::pcm(1, 8000, 12);
        assert!(to_f32_samples(&format, &[0; 4]).is_err());

        let mut format = FormatDescriptor::pcm(1, 8000, 16);
        format.format_tag = 3;
        assert!(to_f32_samples(&format, &[0; 4]).is_err());
    }
}
