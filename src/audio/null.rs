//! A sink that consumes audio at real-time rate and discards it. Used for
//! headless runs and for exercising the controller without a sound card.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;

use crate::audio::feeder::Feeder;
use crate::audio::sink::{OutputSink, SharedGain, SharedState, SinkError, SinkEvent};
use crate::decode::AudioSource;
use crate::playback::state::PlaybackState;

const DEFAULT_PERIOD: Duration = Duration::from_millis(10);
/// Upper bound on samples pulled per wake-up (4 MiB of `f32`)
const MAX_PERIOD_SAMPLES: u128 = 1 << 20;

/// Real-time paced sink without an audio device
pub struct NullSink {
    period: Duration,
    state: Arc<SharedState>,
    gain: Arc<SharedGain>,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl NullSink {
    pub fn new() -> Self {
        Self::with_period(DEFAULT_PERIOD)
    }

    /// `period` is how much audio is pulled per wake-up
    pub fn with_period(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            state: Arc::new(SharedState::default()),
            gain: Arc::new(SharedGain::default()),
            shutdown: None,
            thread: None,
        }
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for NullSink {
    fn init(&mut self, source: Arc<dyn AudioSource>, events: Sender<SinkEvent>) -> Result<(), SinkError> {
        let format = source.wave_format();
        let frames = (format.sample_rate as u128 * self.period.as_micros() / 1_000_000).max(1);
        let samples = frames * format.channels.max(1) as u128;
        if samples > MAX_PERIOD_SAMPLES {
            log::error!(
                "{} Hz x {} ch needs {} samples per {:?}",
                format.sample_rate,
                format.channels,
                samples,
                self.period
            );
            return Err(SinkError::UnsupportedFormat(format));
        }
        let buffer = vec![0.0f32; samples as usize];

        let feeder = Feeder::new(source, Arc::clone(&self.gain), events);
        let (shutdown_tx, shutdown_rx) = channel::bounded(0);
        let state = Arc::clone(&self.state);
        let period = self.period;

        let handle = thread::Builder::new()
            .name("riffplay-null-sink".to_string())
            .spawn(move || deliver(feeder, buffer, period, state, shutdown_rx))
            .map_err(SinkError::Spawn)?;

        self.shutdown = Some(shutdown_tx);
        self.thread = Some(handle);
        Ok(())
    }

    fn play(&mut self) -> Result<(), SinkError> {
        if self.thread.is_none() {
            return Err(SinkError::NotInitialized);
        }
        self.state.store(PlaybackState::Playing);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SinkError> {
        if self.thread.is_none() {
            return Err(SinkError::NotInitialized);
        }
        self.state.store(PlaybackState::Paused);
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the sender wakes the delivery thread
        self.shutdown.take();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("null sink thread panicked");
            }
        }
        self.state.store(PlaybackState::Stopped);
    }

    fn state(&self) -> PlaybackState {
        self.state.load()
    }

    fn volume(&self) -> f32 {
        self.gain.get()
    }

    fn set_volume(&mut self, volume: f32) {
        self.gain.set(volume);
    }
}

impl Drop for NullSink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn deliver(
    mut feeder: Feeder,
    mut buffer: Vec<f32>,
    period: Duration,
    state: Arc<SharedState>,
    shutdown: Receiver<()>,
) {
    let ticker = channel::tick(period);
    loop {
        select! {
            recv(ticker) -> _ => {
                if !state.load().is_playing() {
                    continue;
                }
                feeder.fill(&mut buffer);
                if feeder.is_drained() {
                    state.store(PlaybackState::Stopped);
                    break;
                }
            }
            recv(shutdown) -> _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::WaveDecoder;
    use crate::riff::{AudioContainer, DataChunk, FormatChunk, FourCc, RiffHeader};

    fn source(bytes: usize) -> Arc<dyn AudioSource> {
        source_with(1, 8000, bytes)
    }

    fn source_with(channels: u16, rate: u32, bytes: usize) -> Arc<dyn AudioSource> {
        let mut body = [0u8; 16];
        body[0..2].copy_from_slice(&1u16.to_le_bytes());
        body[2..4].copy_from_slice(&channels.to_le_bytes());
        body[4..8].copy_from_slice(&rate.to_le_bytes());
        body[8..12].copy_from_slice(&rate.saturating_mul(channels as u32).to_le_bytes());
        body[12..14].copy_from_slice(&channels.to_le_bytes());
        body[14..16].copy_from_slice(&8u16.to_le_bytes());
        let riff = RiffHeader::from_bytes(*b"RIFF\x00\x00\x00\x00WAVE").unwrap();
        let data = DataChunk {
            id: FourCc::DATA,
            size: bytes as u32,
            bytes: vec![128; bytes],
        };
        Arc::new(WaveDecoder::from_container(AudioContainer::new(
            riff,
            FormatChunk::from_bytes(16, body),
            data,
        )))
    }

    #[test]
    fn test_commands_require_init() {
        let mut sink = NullSink::new();
        assert!(matches!(sink.play(), Err(SinkError::NotInitialized)));
        assert!(matches!(sink.pause(), Err(SinkError::NotInitialized)));
        sink.stop();
        assert_eq!(sink.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_oversized_format_rejected() {
        let (tx, _rx) = channel::unbounded();
        let mut sink = NullSink::new();
        let result = sink.init(source_with(u16::MAX, 4_000_000_000, 16), tx);
        assert!(matches!(result, Err(SinkError::UnsupportedFormat(_))));
        assert!(matches!(sink.play(), Err(SinkError::NotInitialized)));

        // 48 kHz stereo is well inside the limit
        let (tx, _rx) = channel::unbounded();
        let mut sink = NullSink::new();
        sink.init(source_with(2, 48_000, 16), tx).unwrap();
        sink.stop();
    }

    #[test]
    fn test_drains_short_source() {
        // 50 ms of audio
        let src = source(400);
        let (tx, rx) = channel::unbounded();
        let mut sink = NullSink::with_period(Duration::from_millis(5));
        sink.init(Arc::clone(&src), tx).unwrap();
        sink.play().unwrap();

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, SinkEvent::Drained);
        assert_eq!(src.position(), 400);
        sink.stop();
        assert_eq!(Arc::strong_count(&src), 1);
    }

    #[test]
    fn test_pause_holds_position() {
        let src = source(80_000);
        let (tx, _rx) = channel::unbounded();
        let mut sink = NullSink::with_period(Duration::from_millis(5));
        sink.init(Arc::clone(&src), tx).unwrap();

        // Not started: nothing is pulled
        thread::sleep(Duration::from_millis(30));
        assert_eq!(src.position(), 0);

        sink.play().unwrap();
        thread::sleep(Duration::from_millis(30));
        sink.pause().unwrap();
        // Let an in-flight tick finish
        thread::sleep(Duration::from_millis(20));
        let held = src.position();
        assert!(held > 0);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(src.position(), held);
        assert_eq!(sink.state(), PlaybackState::Paused);
        sink.stop();
    }
}
