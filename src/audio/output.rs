//! Hardware output through cpal.
//!
//! A cpal `Stream` cannot move between threads on every platform, so the
//! stream lives on a dedicated audio thread that owns it from creation to
//! drop. Transport commands reach that thread over a crossbeam channel and
//! wait for its reply, which keeps `play`/`pause` synchronous for the caller.
//!
//! The stream is opened with the source's own sample rate and channel count;
//! there is no resampling, so a device that rejects the format fails `init`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use crossbeam::channel::{self, Receiver, Sender};

use crate::audio::convert;
use crate::audio::feeder::Feeder;
use crate::audio::sink::{OutputSink, SharedGain, SharedState, SinkError, SinkEvent};
use crate::decode::AudioSource;
use crate::playback::state::PlaybackState;

type Reply = Sender<Result<(), SinkError>>;

enum Command {
    Play(Reply),
    Pause(Reply),
    Stop,
}

/// Output sink playing through the default cpal device
pub struct CpalSink {
    commands: Option<Sender<Command>>,
    thread: Option<JoinHandle<()>>,
    state: Arc<SharedState>,
    gain: Arc<SharedGain>,
}

impl CpalSink {
    pub fn new() -> Self {
        Self::with_volume(1.0)
    }

    pub fn with_volume(volume: f32) -> Self {
        Self {
            commands: None,
            thread: None,
            state: Arc::new(SharedState::default()),
            gain: Arc::new(SharedGain::new(volume)),
        }
    }

    fn request(&self, make: impl FnOnce(Reply) -> Command) -> Result<(), SinkError> {
        let commands = self.commands.as_ref().ok_or(SinkError::NotInitialized)?;
        let (reply_tx, reply_rx) = channel::bounded(1);
        commands.send(make(reply_tx)).map_err(|_| SinkError::Disconnected)?;
        reply_rx.recv().map_err(|_| SinkError::Disconnected)?
    }
}

impl Default for CpalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for CpalSink {
    fn init(&mut self, source: Arc<dyn AudioSource>, events: Sender<SinkEvent>) -> Result<(), SinkError> {
        let format = source.wave_format();
        if !convert::is_supported(&format) {
            return Err(SinkError::UnsupportedFormat(format));
        }

        let (command_tx, command_rx) = channel::unbounded();
        let (ready_tx, ready_rx) = channel::bounded(1);
        let state = Arc::clone(&self.state);
        let gain = Arc::clone(&self.gain);

        let handle = thread::Builder::new()
            .name("riffplay-audio".to_string())
            .spawn(move || audio_thread(source, events, state, gain, command_rx, ready_tx))
            .map_err(SinkError::Spawn)?;

        // The thread reports whether the stream could be built before
        // entering its command loop.
        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.commands = Some(command_tx);
                self.thread = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(SinkError::Disconnected)
            }
        }
    }

    fn play(&mut self) -> Result<(), SinkError> {
        self.request(Command::Play)
    }

    fn pause(&mut self) -> Result<(), SinkError> {
        self.request(Command::Pause)
    }

    fn stop(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Stop);
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("audio thread panicked");
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

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn audio_thread(
    source: Arc<dyn AudioSource>,
    events: Sender<SinkEvent>,
    state: Arc<SharedState>,
    gain: Arc<SharedGain>,
    commands: Receiver<Command>,
    ready: Sender<Result<(), SinkError>>,
) {
    let stream = match build_stream(source, events, Arc::clone(&state), gain) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    for command in commands.iter() {
        match command {
            Command::Play(reply) => {
                let result = stream.play().map_err(SinkError::from);
                if result.is_ok() {
                    state.store(PlaybackState::Playing);
                }
                let _ = reply.send(result);
            }
            Command::Pause(reply) => {
                let result = stream.pause().map_err(SinkError::from);
                if result.is_ok() {
                    state.store(PlaybackState::Paused);
                }
                let _ = reply.send(result);
            }
            Command::Stop => break,
        }
    }

    drop(stream);
    state.store(PlaybackState::Stopped);
    log::debug!("audio thread finished");
}

fn build_stream(
    source: Arc<dyn AudioSource>,
    events: Sender<SinkEvent>,
    state: Arc<SharedState>,
    gain: Arc<SharedGain>,
) -> Result<Stream, SinkError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(SinkError::NoDevice)?;

    let mut feeder = Feeder::new(source, gain, events.clone());
    let config = StreamConfig {
        channels: feeder.format().channels,
        sample_rate: cpal::SampleRate(feeder.format().sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    log::info!(
        "Opening output stream: {} Hz, {} ch",
        config.sample_rate.0,
        config.channels
    );

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            // Runs on the real-time thread: no blocking beyond the source's
            // short read lock.
            if !state.load().is_playing() {
                data.fill(0.0);
                return;
            }
            feeder.fill(data);
            if feeder.is_drained() {
                state.store(PlaybackState::Stopped);
            }
        },
        move |err| {
            log::error!("Audio stream error: {}", err);
            let _ = events.send(SinkEvent::Failed(err.to_string()));
        },
        None,
    )?;

    Ok(stream)
}
