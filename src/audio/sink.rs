//! Output sink abstraction: the component that pulls bytes from a source at
//! playback rate and hands them to the audio hardware.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use crossbeam::channel::Sender;

use crate::decode::{AudioSource, WaveFormat};
use crate::playback::state::PlaybackState;

/// Asynchronous notifications raised by a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// The source returned end of data and everything was delivered
    Drained,
    /// Delivery failed; playback cannot continue
    Failed(String),
}

/// Error type for sink operations
#[derive(Debug)]
pub enum SinkError {
    DefaultConfig(cpal::DefaultStreamConfigError),
    BuildStream(cpal::BuildStreamError),
    PlayStream(cpal::PlayStreamError),
    PauseStream(cpal::PauseStreamError),
    UnsupportedFormat(WaveFormat),
    Spawn(std::io::Error),
    NoDevice,
    NotInitialized,
    Disconnected,
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::DefaultConfig(e) => write!(f, "cpal default config error: {}", e),
            SinkError::BuildStream(e) => write!(f, "cpal build stream error: {}", e),
            SinkError::PlayStream(e) => write!(f, "cpal play stream error: {}", e),
            SinkError::PauseStream(e) => write!(f, "cpal pause stream error: {}", e),
            SinkError::UnsupportedFormat(fmt) => write!(
                f,
                "Unsupported sample format: {:?} {} bit",
                fmt.encoding, fmt.bits_per_sample
            ),
            SinkError::Spawn(e) => write!(f, "Failed to start audio thread: {}", e),
            SinkError::NoDevice => write!(f, "No audio output device available"),
            SinkError::NotInitialized => write!(f, "Sink has no source attached"),
            SinkError::Disconnected => write!(f, "Audio thread is no longer running"),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<cpal::DefaultStreamConfigError> for SinkError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        SinkError::DefaultConfig(err)
    }
}

impl From<cpal::BuildStreamError> for SinkError {
    fn from(err: cpal::BuildStreamError) -> Self {
        SinkError::BuildStream(err)
    }
}

impl From<cpal::PlayStreamError> for SinkError {
    fn from(err: cpal::PlayStreamError) -> Self {
        SinkError::PlayStream(err)
    }
}

impl From<cpal::PauseStreamError> for SinkError {
    fn from(err: cpal::PauseStreamError) -> Self {
        SinkError::PauseStream(err)
    }
}

/// Sink state readable from the delivery thread without locking
#[derive(Debug, Default)]
pub(crate) struct SharedState(AtomicU8);

impl SharedState {
    pub(crate) fn load(&self) -> PlaybackState {
        match self.0.load(Ordering::Acquire) {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Paused,
            _ => PlaybackState::Stopped,
        }
    }

    pub(crate) fn store(&self, state: PlaybackState) {
        let raw = match state {
            PlaybackState::Stopped => 0,
            PlaybackState::Playing => 1,
            PlaybackState::Paused => 2,
        };
        self.0.store(raw, Ordering::Release);
    }
}

/// Output gain stored as f32 bits
#[derive(Debug)]
pub(crate) struct SharedGain(AtomicU32);

impl SharedGain {
    pub(crate) fn new(volume: f32) -> Self {
        Self(AtomicU32::new(clamp_gain(volume).to_bits()))
    }

    pub(crate) fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, volume: f32) {
        self.0.store(clamp_gain(volume).to_bits(), Ordering::Relaxed);
    }
}

/// Clamp to [0.0, 1.0]; NaN mutes
pub(crate) fn clamp_gain(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

impl Default for SharedGain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// A playback device.
///
/// `init` is called once before any transport command. After `stop` the sink
/// must no longer touch the source and must have released its reference.
pub trait OutputSink: Send {
    /// Attach the source and the channel used to report [`SinkEvent`]s
    fn init(&mut self, source: Arc<dyn AudioSource>, events: Sender<SinkEvent>) -> Result<(), SinkError>;

    /// Start or resume delivery
    fn play(&mut self) -> Result<(), SinkError>;

    /// Suspend delivery, keeping the source position
    fn pause(&mut self) -> Result<(), SinkError>;

    /// Stop delivery for good and release the source
    fn stop(&mut self);

    fn state(&self) -> PlaybackState;

    fn volume(&self) -> f32;

    /// Set the output gain, clamped to [0.0, 1.0]
    fn set_volume(&mut self, volume: f32);
}
