//! Stream format information exposed by audio sources.

use crate::riff::FormatChunk;

/// Sample encoding named by the format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Integer PCM (tag 0x0001)
    Pcm,
    /// IEEE float (tag 0x0003)
    IeeeFloat,
    /// Any other tag, e.g. A-law, mu-law or extensible
    Other(u16),
}

impl From<u16> for SampleEncoding {
    fn from(tag: u16) -> Self {
        match tag {
            0x0001 => SampleEncoding::Pcm,
            0x0003 => SampleEncoding::IeeeFloat,
            other => SampleEncoding::Other(other),
        }
    }
}

/// Format of the byte stream a source delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    pub encoding: SampleEncoding,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub block_align: u16,
    pub byte_rate: u32,
}

impl WaveFormat {
    /// Bytes per sample of a single channel
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8)
    }
}

impl From<&FormatChunk> for WaveFormat {
    fn from(chunk: &FormatChunk) -> Self {
        Self {
            encoding: chunk.audio_format.into(),
            sample_rate: chunk.sample_rate,
            channels: chunk.num_channels,
            bits_per_sample: chunk.bits_per_sample,
            block_align: chunk.block_align,
            byte_rate: chunk.byte_rate,
        }
    }
}
