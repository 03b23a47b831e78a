//! The decodable-audio-source capability.
//!
//! Playback only talks to decoders through [`AudioSource`], so formats other
//! than WAVE can be plugged in through the registry.

use std::io;
use std::path::PathBuf;

use crate::core::time::{self, Time};
use crate::decode::stream_info::WaveFormat;
use crate::error::{BoundsError, FormatError};

/// Error type for decoding operations
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),
    #[error("Read of {requested} bytes does not fit a {capacity}-byte buffer")]
    BufferTooSmall { requested: usize, capacity: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("No decoder registered for {0:?}")]
    Unsupported(PathBuf),
}

/// A random-access source of raw audio bytes.
///
/// All methods take `&self`: the output sink reads on its own thread while
/// the controller seeks, so implementations serialize access internally and
/// must treat read-then-advance as one step.
pub trait AudioSource: Send + Sync {
    /// Decoder identity, e.g. for logs
    fn name(&self) -> &str;

    fn wave_format(&self) -> WaveFormat;

    /// Length of the audio data in bytes
    fn length(&self) -> u64;

    /// Read cursor, a byte offset into the audio data
    fn position(&self) -> u64;

    /// Move the read cursor. Offsets past `length()` are a `BoundsError`.
    fn set_position(&self, position: u64) -> Result<(), DecodeError>;

    /// Copy up to `requested` bytes from the cursor into `buffer` and advance
    /// by the number of bytes copied. Returns 0 at the end of the data.
    fn read(&self, buffer: &mut [u8], requested: usize) -> Result<usize, DecodeError>;

    /// Move the cursor to a whole-second offset. Returns the new position.
    fn seek(&self, seconds: u64) -> Result<u64, DecodeError>;

    fn current_time(&self) -> Time {
        time::bytes_to_time(self.position(), self.wave_format().byte_rate)
    }

    fn total_duration(&self) -> Time {
        time::bytes_to_time(self.length(), self.wave_format().byte_rate)
    }
}
