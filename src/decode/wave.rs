//! WAVE decoder: a read cursor over a fully parsed [`AudioContainer`].

use std::path::Path;

use parking_lot::Mutex;

use crate::core::time;
use crate::decode::decoder::{AudioSource, DecodeError};
use crate::decode::stream_info::WaveFormat;
use crate::error::BoundsError;
use crate::riff::{self, AudioContainer, ParseOptions};

/// Decodes and serves WAVE files from memory
pub struct WaveDecoder {
    container: AudioContainer,
    format: WaveFormat,
    /// Byte offset into the data chunk. The lock also covers the copy in
    /// `read`, so readers never observe a half-advanced cursor.
    position: Mutex<u64>,
}

impl WaveDecoder {
    /// Parse a file with default options. Fails instead of producing a
    /// partially usable decoder.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        Self::open_with(path, ParseOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self, DecodeError> {
        let container = riff::parse_file(path.as_ref(), options)?;
        Ok(Self::from_container(container))
    }

    pub fn from_container(container: AudioContainer) -> Self {
        let format = WaveFormat::from(container.format());
        Self {
            container,
            format,
            position: Mutex::new(0),
        }
    }

    pub fn container(&self) -> &AudioContainer {
        &self.container
    }
}

impl AudioSource for WaveDecoder {
    fn name(&self) -> &str {
        "WaveDecoder"
    }

    fn wave_format(&self) -> WaveFormat {
        self.format
    }

    fn length(&self) -> u64 {
        self.container.data_len()
    }

    fn position(&self) -> u64 {
        *self.position.lock()
    }

    fn set_position(&self, position: u64) -> Result<(), DecodeError> {
        let length = self.length();
        if position > length {
            return Err(BoundsError {
                requested: position,
                length,
            }
            .into());
        }
        *self.position.lock() = position;
        Ok(())
    }

    fn read(&self, buffer: &mut [u8], requested: usize) -> Result<usize, DecodeError> {
        if requested > buffer.len() {
            return Err(DecodeError::BufferTooSmall {
                requested,
                capacity: buffer.len(),
            });
        }

        let samples = self.container.samples();
        let mut position = self.position.lock();
        let start = (*position).min(samples.len() as u64) as usize;
        let count = requested.min(samples.len() - start);

        buffer[..count].copy_from_slice(&samples[start..start + count]);
        *position = (start + count) as u64;
        Ok(count)
    }

    fn seek(&self, seconds: u64) -> Result<u64, DecodeError> {
        let target = time::seconds_to_bytes(seconds, self.format.byte_rate);
        let clamped = target.min(self.length());
        if clamped < target {
            log::debug!("seek to {}s clamped to end of data ({} bytes)", seconds, clamped);
        }
        *self.position.lock() = clamped;
        Ok(clamped)
    }
}
