//! Chunk-level primitives: tags, headers, little-endian fields and skipping.

use std::fmt;
use std::io::{self, Read};

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// A four-character chunk tag such as `RIFF` or `fmt `.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const RIFF: FourCc = FourCc(*b"RIFF");
    pub const WAVE: FourCc = FourCc(*b"WAVE");
    pub const FMT: FourCc = FourCc(*b"fmt ");
    pub const DATA: FourCc = FourCc(*b"data");
    pub const LIST: FourCc = FourCc(*b"LIST");
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc(\"{}\")", self)
    }
}

/// How unknown chunks are skipped. RIFF pads odd-sized chunks with one
/// byte; `Packed` ignores the pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkAlignment {
    /// Advance exactly the declared size.
    #[default]
    Packed,
    /// Advance the declared size plus the pad byte after odd-sized chunks.
    WordAligned,
}

impl ChunkAlignment {
    /// Number of bytes occupied by a chunk payload of `size` bytes.
    pub fn padded_len(self, size: u32) -> u64 {
        match self {
            ChunkAlignment::Packed => size as u64,
            ChunkAlignment::WordAligned => size as u64 + (size as u64 & 1),
        }
    }
}

/// Chunk header (4 byte ID + 4 byte size)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: FourCc,
    pub size: u32,
}

impl ChunkHeader {
    pub const LEN: usize = 8;

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        ChunkHeader {
            id: FourCc([bytes[0], bytes[1], bytes[2], bytes[3]]),
            size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Read the next header. `Ok(None)` means the stream ended cleanly on a
    /// chunk boundary; a partial header is reported as truncation.
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<Self>, FormatError> {
        let mut bytes = [0u8; Self::LEN];
        let mut filled = 0;
        while filled < Self::LEN {
            match reader.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FormatError::Io(e)),
            }
        }

        match filled {
            0 => Ok(None),
            Self::LEN => Ok(Some(Self::from_bytes(bytes))),
            _ => Err(FormatError::Truncated {
                context: "chunk header",
            }),
        }
    }
}

#[inline]
pub(crate) fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

#[inline]
pub(crate) fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Advance past `len` bytes without buffering them.
pub(crate) fn skip<R: Read>(reader: &mut R, len: u64, context: &'static str) -> Result<(), FormatError> {
    if len == 0 {
        return Ok(());
    }
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped < len {
        return Err(FormatError::Truncated { context });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_fourcc_display() {
        assert_eq!(FourCc::FMT.to_string(), "fmt ");
        assert_eq!(FourCc([b'a', 0, b'c', 0xff]).to_string(), "a\\x00c\\xff");
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(ChunkAlignment::Packed.padded_len(7), 7);
        assert_eq!(ChunkAlignment::WordAligned.padded_len(7), 8);
        assert_eq!(ChunkAlignment::WordAligned.padded_len(8), 8);
        assert_eq!(ChunkAlignment::WordAligned.padded_len(u32::MAX), u32::MAX as u64 + 1);
    }

    #[test]
    fn test_read_header() {
        let mut cursor = Cursor::new(b"LIST\x04\x00\x00\x00".to_vec());
        let header = ChunkHeader::read(&mut cursor).unwrap().unwrap();
        assert_eq!(header.id, FourCc::LIST);
        assert_eq!(header.size, 4);

        // Clean end of stream
        assert!(ChunkHeader::read(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_read_partial_header() {
        let mut cursor = Cursor::new(b"dat".to_vec());
        let err = ChunkHeader::read(&mut cursor).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { context: "chunk header" }));
    }

    #[test]
    fn test_skip_short_stream() {
        let mut cursor = Cursor::new(vec![0u8; 3]);
        assert!(skip(&mut cursor, 3, "test").is_ok());

        let mut cursor = Cursor::new(vec![0u8; 3]);
        let err = skip(&mut cursor, 4, "test").unwrap_err();
        assert!(matches!(err, FormatError::Truncated { context: "test" }));
    }

    #[test]
    fn test_le_fields() {
        let bytes = [0x40, 0x1f, 0x00, 0x00, 0x01, 0x00];
        assert_eq!(le_u32(&bytes, 0), 8000);
        assert_eq!(le_u16(&bytes, 4), 1);
    }
}
