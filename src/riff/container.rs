//! In-memory representation of a parsed WAVE file.

use crate::core::time::{self, Time};
use crate::error::FormatError;
use crate::riff::chunk::{le_u16, le_u32, FourCc};

/// The 12-byte file header: `RIFF`, declared size, `WAVE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    pub id: FourCc,
    pub size: u32,
    pub form: FourCc,
}

impl RiffHeader {
    pub const LEN: usize = 12;

    /// Parse and check the `RIFF`/`WAVE` markers.
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Result<Self, FormatError> {
        let header = RiffHeader {
            id: FourCc([bytes[0], bytes[1], bytes[2], bytes[3]]),
            size: le_u32(&bytes, 4),
            form: FourCc([bytes[8], bytes[9], bytes[10], bytes[11]]),
        };

        if header.id != FourCc::RIFF {
            return Err(FormatError::NotRiff {
                found: header.id.to_string(),
            });
        }
        if header.form != FourCc::WAVE {
            return Err(FormatError::NotWave {
                found: header.form.to_string(),
            });
        }
        Ok(header)
    }
}

/// The fixed 16-byte body of a `fmt ` chunk.
///
/// `size` is the declared chunk size; anything past the first 16 bytes
/// (extensible formats) is skipped by the parser and not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatChunk {
    pub id: FourCc,
    pub size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatChunk {
    pub const FIXED_LEN: usize = 16;

    pub fn from_bytes(size: u32, body: [u8; Self::FIXED_LEN]) -> Self {
        FormatChunk {
            id: FourCc::FMT,
            size,
            audio_format: le_u16(&body, 0),
            num_channels: le_u16(&body, 2),
            sample_rate: le_u32(&body, 4),
            byte_rate: le_u32(&body, 8),
            block_align: le_u16(&body, 12),
            bits_per_sample: le_u16(&body, 14),
        }
    }

    /// `sampleRate * numChannels * bitsPerSample / 8`
    pub fn expected_byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.num_channels as u64 * self.bits_per_sample as u64 / 8
    }

    /// Reject parameters that would break time arithmetic.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.num_channels == 0 {
            return Err(FormatError::InvalidFormat("channel count is 0".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(FormatError::InvalidFormat("sample rate is 0".to_string()));
        }
        if self.byte_rate == 0 {
            return Err(FormatError::InvalidFormat("byte rate is 0".to_string()));
        }
        if self.bits_per_sample == 0 {
            return Err(FormatError::InvalidFormat("bits per sample is 0".to_string()));
        }
        if self.block_align == 0 {
            return Err(FormatError::InvalidFormat("block align is 0".to_string()));
        }
        Ok(())
    }
}

/// The `data` chunk and its owned payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub id: FourCc,
    pub size: u32,
    pub bytes: Vec<u8>,
}

/// A fully parsed WAVE file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioContainer {
    riff: RiffHeader,
    format: FormatChunk,
    data: DataChunk,
}

impl AudioContainer {
    pub fn new(riff: RiffHeader, format: FormatChunk, data: DataChunk) -> Self {
        Self { riff, format, data }
    }

    pub fn riff(&self) -> &RiffHeader {
        &self.riff
    }

    pub fn format(&self) -> &FormatChunk {
        &self.format
    }

    pub fn data(&self) -> &DataChunk {
        &self.data
    }

    /// Raw sample bytes
    pub fn samples(&self) -> &[u8] {
        &self.data.bytes
    }

    /// Length of the sample data in bytes
    pub fn data_len(&self) -> u64 {
        self.data.bytes.len() as u64
    }

    /// Playback length derived from the data length and byte rate
    pub fn duration(&self) -> Time {
        time::bytes_to_time(self.data_len(), self.format.byte_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm_body(channels: u16, rate: u32, bits: u16) -> [u8; 16] {
        let block_align = channels * bits / 8;
        let mut body = [0u8; 16];
        body[0..2].copy_from_slice(&1u16.to_le_bytes());
        body[2..4].copy_from_slice(&channels.to_le_bytes());
        body[4..8].copy_from_slice(&rate.to_le_bytes());
        body[8..12].copy_from_slice(&(rate * block_align as u32).to_le_bytes());
        body[12..14].copy_from_slice(&block_align.to_le_bytes());
        body[14..16].copy_from_slice(&bits.to_le_bytes());
        body
    }

    #[test]
    fn test_riff_header_markers() {
        let ok = *b"RIFF\x24\x00\x00\x00WAVE";
        let header = RiffHeader::from_bytes(ok).unwrap();
        assert_eq!(header.size, 36);

        let err = RiffHeader::from_bytes(*b"RIFX\x24\x00\x00\x00WAVE").unwrap_err();
        assert!(matches!(err, FormatError::NotRiff { ref found } if found == "RIFX"));

        let err = RiffHeader::from_bytes(*b"RIFF\x24\x00\x00\x00AVI ").unwrap_err();
        assert!(matches!(err, FormatError::NotWave { ref found } if found == "AVI "));
    }

    #[test]
    fn test_format_fields() {
        let format = FormatChunk::from_bytes(16, pcm_body(2, 44100, 16));
        assert_eq!(format.audio_format, 1);
        assert_eq!(format.num_channels, 2);
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(format.byte_rate, 176_400);
        assert_eq!(format.block_align, 4);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(format.expected_byte_rate(), 176_400);
        assert!(format.validate().is_ok());
    }

    #[test]
    fn test_format_validation() {
        let mut format = FormatChunk::from_bytes(16, pcm_body(1, 8000, 8));
        format.num_channels = 0;
        assert!(format.validate().is_err());

        let mut format = FormatChunk::from_bytes(16, pcm_body(1, 8000, 8));
        format.sample_rate = 0;
        assert!(format.validate().is_err());

        let mut format = FormatChunk::from_bytes(16, pcm_body(1, 8000, 8));
        format.byte_rate = 0;
        assert!(format.validate().is_err());

        let mut format = FormatChunk::from_bytes(16, pcm_body(1, 8000, 8));
        format.bits_per_sample = 0;
        assert!(matches!(format.validate(), Err(FormatError::InvalidFormat(_))));

        let mut format = FormatChunk::from_bytes(16, pcm_body(1, 8000, 8));
        format.block_align = 0;
        assert!(matches!(format.validate(), Err(FormatError::InvalidFormat(_))));
    }

    #[test]
    fn test_container_duration() {
        let riff = RiffHeader::from_bytes(*b"RIFF\x00\x00\x00\x00WAVE").unwrap();
        let format = FormatChunk::from_bytes(16, pcm_body(1, 8000, 8));
        let data = DataChunk {
            id: FourCc::DATA,
            size: 8000,
            bytes: vec![128; 8000],
        };
        let container = AudioContainer::new(riff, format, data);
        assert_eq!(container.data_len(), 8000);
        assert_eq!(container.duration(), time::from_seconds(1.0));
    }
}
