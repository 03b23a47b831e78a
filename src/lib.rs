//! riffplay: RIFF/WAVE decoding and a small playback controller.
//!
//! The crate is layered bottom-up:
//!
//! - [`riff`] parses the container into an [`riff::AudioContainer`];
//! - [`decode`] wraps it in a thread-safe, seekable [`decode::AudioSource`];
//! - [`audio`] delivers a source to an output device, or discards it;
//! - [`playback`] drives a source and a sink with play/pause/stop/seek and
//!   progress notifications.

pub mod audio;
pub mod config;
pub mod core;
pub mod decode;
pub mod error;
pub mod playback;
pub mod riff;

pub use config::PlaybackConfig;
pub use error::{BoundsError, FormatError};
pub use playback::{Playback, PlaybackError, PlaybackState, Progress, StopReason};
