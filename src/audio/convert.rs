//! Raw little-endian PCM bytes to f32 samples in [-1.0, 1.0].

use crate::decode::{SampleEncoding, WaveFormat};

/// Whether [`to_f32`] can convert this format
pub fn is_supported(format: &WaveFormat) -> bool {
    matches!(
        (format.encoding, format.bits_per_sample),
        (SampleEncoding::Pcm, 8 | 16 | 24 | 32) | (SampleEncoding::IeeeFloat, 32 | 64)
    )
}

/// Convert whole samples from `bytes` into `out`. Returns the number of
/// samples written; trailing bytes that do not form a full sample are
/// ignored. Unsupported formats write nothing.
pub fn to_f32(format: &WaveFormat, bytes: &[u8], out: &mut [f32]) -> usize {
    if !is_supported(format) {
        return 0;
    }
    let width = format.bytes_per_sample();
    let count = (bytes.len() / width).min(out.len());

    for (sample, raw) in out[..count].iter_mut().zip(bytes.chunks_exact(width)) {
        *sample = match (format.encoding, width) {
            (SampleEncoding::Pcm, 1) => (raw[0] as f32 - 128.0) / 128.0,
            (SampleEncoding::Pcm, 2) => i16::from_le_bytes([raw[0], raw[1]]) as f32 / 32768.0,
            (SampleEncoding::Pcm, 3) => {
                // Sign-extend through the top byte of an i32
                let value = i32::from_le_bytes([0, raw[0], raw[1], raw[2]]) >> 8;
                value as f32 / 8388608.0
            }
            (SampleEncoding::Pcm, 4) => {
                i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f32 / 2147483648.0
            }
            (SampleEncoding::IeeeFloat, 4) => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            (SampleEncoding::IeeeFloat, 8) => f64::from_le_bytes([
                raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
            ]) as f32,
            _ => 0.0,
        };
    }
    count
}
