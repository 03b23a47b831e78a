//! Time representation and the byte-offset/time arithmetic used by seeking.
//! All playback times are nanoseconds (i64); byte offsets are converted with
//! the stream's byte rate.

use crate::error::FormatError;

/// Time in nanoseconds from the start of the audio data
pub type Time = i64;

/// Unit constants
pub mod constants {
    use super::Time;

    pub const NANOS_PER_SECOND: Time = 1_000_000_000;
    pub const NANOS_PER_MILLI: Time = 1_000_000;
    pub const SECONDS_PER_MINUTE: u64 = 60;
}

/// Time zero constant
pub const ZERO: Time = 0;

/// Fractional seconds to `Time`
#[inline]
pub fn from_seconds(seconds: f64) -> Time {
    (seconds * constants::NANOS_PER_SECOND as f64) as Time
}

#[inline]
pub fn from_millis(millis: i64) -> Time {
    millis * constants::NANOS_PER_MILLI
}

/// Convert a byte offset into the data chunk to a playback time.
///
/// A zero byte rate yields `ZERO`; the parser rejects such streams, so this
/// only guards against hand-built formats.
pub fn bytes_to_time(bytes: u64, byte_rate: u32) -> Time {
    if byte_rate == 0 {
        return ZERO;
    }
    let nanos = bytes as u128 * constants::NANOS_PER_SECOND as u128 / byte_rate as u128;
    nanos.min(Time::MAX as u128) as Time
}

/// Byte offset of a whole-second time, saturating instead of overflowing.
#[inline]
pub fn seconds_to_bytes(seconds: u64, byte_rate: u32) -> u64 {
    seconds.saturating_mul(byte_rate as u64)
}

/// Format time as MM:SS (minutes keep growing past 59)
pub fn format_time(nanos: Time) -> String {
    let total_seconds = (nanos.max(0) / constants::NANOS_PER_SECOND) as u64;
    let minutes = total_seconds / constants::SECONDS_PER_MINUTE;
    let seconds = total_seconds % constants::SECONDS_PER_MINUTE;

    format!("{:02}:{:02}", minutes, seconds)
}

/// Parse a `minutes:seconds` seek string into whole seconds.
///
/// Exactly two fields, each one or two ASCII digits in `0..=59`. Anything
/// else (missing separator, signs, whitespace, a third field) is rejected.
pub fn parse_seek_time(input: &str) -> Result<u64, FormatError> {
    let invalid = || FormatError::InvalidSeekTime {
        input: input.to_string(),
    };

    let (minutes, seconds) = input.split_once(':').ok_or_else(invalid)?;
    let minutes = parse_field(minutes).ok_or_else(invalid)?;
    let seconds = parse_field(seconds).ok_or_else(invalid)?;

    Ok(minutes * constants::SECONDS_PER_MINUTE + seconds)
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = field.parse().ok()?;
    (value < constants::SECONDS_PER_MINUTE).then_some(value)
}
