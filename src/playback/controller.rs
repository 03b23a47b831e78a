//! Playback controller: transport commands, progress notifications and
//! session teardown.
//!
//! A [`Playback`] owns one decoder and one output sink for its whole life.
//! Two things run beside the caller's thread:
//!
//! - the sink's delivery thread, which pulls bytes from the decoder;
//! - a progress worker, started by the first `play()`, which emits `elapsed`
//!   on a fixed interval and reacts to the sink's completion or failure.
//!
//! Both `stop()` and a sink-reported end of stream go through the same
//! teardown: stop the sink, drop it, then drop the decoder. The session lock
//! is what the progress worker checks before every tick, so no tick can run
//! against a released decoder. A stopped controller cannot be restarted.
//!
//! The progress worker keeps ticking while paused; `current_time()` does not
//! move then because the sink stops pulling.
//!
//! Observer handlers run on the progress worker (for `elapsed` and natural
//! end of stream) or on the thread calling `stop()`. They must not block on
//! the controller itself: `stop()` joins the progress worker.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use parking_lot::Mutex;

use crate::audio::sink::clamp_gain;
use crate::audio::{OutputSink, SinkError, SinkEvent};
use crate::config::{ConfigError, PlaybackConfig};
use crate::core::time::{self, Time};
use crate::decode::{AudioSource, DecodeError, DecoderProvider, WaveFormat};
use crate::error::FormatError;
use crate::playback::events::{Observers, Progress, StopReason, SubscriptionId};
use crate::playback::state::PlaybackState;

/// Error type for the playback controller
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Playback has been stopped; create a new one to play again")]
    Disposed,
    #[error("Thread error: {0}")]
    Thread(String),
}

const SINK_DISCONNECTED: &str = "sink disconnected";

struct Session {
    source: Arc<dyn AudioSource>,
    sink: Box<dyn OutputSink>,
}

/// State shared with the progress worker
struct Shared {
    session: Mutex<Option<Session>>,
    observers: Observers,
    byte_rate: u32,
    total_duration: Time,
    /// Cursor captured at teardown, reported once the decoder is gone
    final_position: AtomicU64,
}

impl Shared {
    fn progress(&self) -> Option<Progress> {
        let guard = self.session.lock();
        let session = guard.as_ref()?;
        let position = session.source.position();
        Some(Progress {
            position,
            current_time: time::bytes_to_time(position, self.byte_rate),
            total_duration: self.total_duration,
            state: session.sink.state(),
        })
    }

    /// Release the sink, then the decoder. Returns `false` when the session
    /// was already released.
    ///
    /// The lock is held until the final position is recorded, so accessors
    /// never see a released session without it. Sink threads never take
    /// this lock, which keeps `sink.stop()` safe to call under it.
    fn teardown(&self) -> bool {
        let mut guard = self.session.lock();
        let Some(Session { source, mut sink }) = guard.take() else {
            return false;
        };

        sink.stop();
        drop(sink);
        self.final_position.store(source.position(), Ordering::Relaxed);
        drop(source);
        drop(guard);

        log::info!("Playback session released");
        true
    }
}

/// A playback session over one audio source
pub struct Playback {
    shared: Arc<Shared>,
    format: WaveFormat,
    progress_interval: Duration,
    volume: f32,
    sink_events: Option<Receiver<SinkEvent>>,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Playback {
    /// Resolve a decoder for `path` and attach it to `sink`. Parse failures
    /// are returned to the caller; nothing is left half-constructed.
    pub fn open<P: AsRef<Path>>(
        path: P,
        provider: &dyn DecoderProvider,
        sink: Box<dyn OutputSink>,
        config: PlaybackConfig,
    ) -> Result<Self, PlaybackError> {
        let source = provider.decoder_for(path.as_ref())?;
        Self::new(source, sink, config)
    }

    /// Create a stopped session over an already opened source
    pub fn new(
        source: Arc<dyn AudioSource>,
        mut sink: Box<dyn OutputSink>,
        config: PlaybackConfig,
    ) -> Result<Self, PlaybackError> {
        config.validate()?;

        let format = source.wave_format();
        let total_duration = source.total_duration();
        let (events_tx, events_rx) = channel::unbounded();

        sink.set_volume(config.initial_volume);
        sink.init(Arc::clone(&source), events_tx)?;

        log::info!(
            "{} ready: {} ({} bytes)",
            source.name(),
            time::format_time(total_duration),
            source.length()
        );

        let shared = Arc::new(Shared {
            session: Mutex::new(Some(Session { source, sink })),
            observers: Observers::new(),
            byte_rate: format.byte_rate,
            total_duration,
            final_position: AtomicU64::new(0),
        });

        Ok(Self {
            shared,
            format,
            progress_interval: config.progress_interval(),
            volume: config.initial_volume,
            sink_events: Some(events_rx),
            shutdown: None,
            worker: None,
        })
    }

    /// Start or resume playback
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        {
            let mut guard = self.shared.session.lock();
            let session = guard.as_mut().ok_or(PlaybackError::Disposed)?;
            if session.sink.state().is_playing() {
                return Ok(());
            }
            session.sink.play()?;
        }
        log::debug!("play");
        self.start_worker()
    }

    /// Pause playback. A no-op unless playing.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        let mut guard = self.shared.session.lock();
        if let Some(session) = guard.as_mut() {
            if session.sink.state().is_playing() {
                session.sink.pause()?;
                log::debug!("pause at byte {}", session.source.position());
            }
        }
        Ok(())
    }

    /// Stop playback and release the sink and decoder. Raises `stopped`
    /// unless the session had already ended.
    pub fn stop(&mut self) -> Result<(), PlaybackError> {
        let released = self.shared.teardown();
        self.join_worker()?;
        if released {
            self.shared.observers.emit_stopped(&StopReason::UserRequested);
        }
        Ok(())
    }

    /// Seek to a `MM:SS` position. Malformed input is rejected and leaves
    /// the position and state untouched. Seeking past the end lands on the
    /// end of the data.
    pub fn seek(&mut self, text: &str) -> Result<(), PlaybackError> {
        let seconds = time::parse_seek_time(text).map_err(|e| {
            log::warn!("Ignoring seek: {}", e);
            e
        })?;

        let guard = self.shared.session.lock();
        let session = guard.as_ref().ok_or(PlaybackError::Disposed)?;
        let position = session.source.seek(seconds)?;
        log::debug!("seek {} -> byte {}", text, position);
        Ok(())
    }

    /// Read cursor in bytes
    pub fn position(&self) -> u64 {
        match self.shared.session.lock().as_ref() {
            Some(session) => session.source.position(),
            None => self.shared.final_position.load(Ordering::Relaxed),
        }
    }

    /// Move the read cursor directly, e.g. `set_position(0)` to rewind
    pub fn set_position(&mut self, position: u64) -> Result<(), PlaybackError> {
        let guard = self.shared.session.lock();
        let session = guard.as_ref().ok_or(PlaybackError::Disposed)?;
        session.source.set_position(position)?;
        Ok(())
    }

    pub fn current_time(&self) -> Time {
        time::bytes_to_time(self.position(), self.shared.byte_rate)
    }

    pub fn total_duration(&self) -> Time {
        self.shared.total_duration
    }

    pub fn state(&self) -> PlaybackState {
        self.shared
            .session
            .lock()
            .as_ref()
            .map(|session| session.sink.state())
            .unwrap_or(PlaybackState::Stopped)
    }

    /// True once the session has been torn down
    pub fn is_disposed(&self) -> bool {
        self.shared.session.lock().is_none()
    }

    pub fn wave_format(&self) -> WaveFormat {
        self.format
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the sink volume, clamped to [0.0, 1.0]. NaN mutes.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_gain(volume);
        if let Some(session) = self.shared.session.lock().as_mut() {
            session.sink.set_volume(self.volume);
        }
    }

    /// Register a handler for periodic progress
    pub fn on_elapsed<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.shared.observers.on_elapsed(handler)
    }

    /// Register a handler for the terminal stop notification
    pub fn on_stopped<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&StopReason) + Send + Sync + 'static,
    {
        self.shared.observers.on_stopped(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.observers.unsubscribe(id)
    }

    fn start_worker(&mut self) -> Result<(), PlaybackError> {
        if self.worker.is_some() {
            return Ok(());
        }
        let Some(sink_events) = self.sink_events.take() else {
            return Ok(());
        };

        let (shutdown_tx, shutdown_rx) = channel::bounded(0);
        let shared = Arc::clone(&self.shared);
        let interval = self.progress_interval;

        let handle = thread::Builder::new()
            .name("riffplay-progress".to_string())
            .spawn(move || run_worker(shared, sink_events, shutdown_rx, interval))
            .map_err(|e| PlaybackError::Thread(e.to_string()))?;

        self.shutdown = Some(shutdown_tx);
        self.worker = Some(handle);
        Ok(())
    }

    fn join_worker(&mut self) -> Result<(), PlaybackError> {
        // Dropping the sender wakes the worker
        self.shutdown.take();
        self.sink_events.take();
        if let Some(handle) = self.worker.take() {
            handle
                .join()
                .map_err(|_| PlaybackError::Thread("progress worker panicked".to_string()))?;
        }
        Ok(())
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.shared.teardown();
        if let Err(e) = self.join_worker() {
            log::error!("{}", e);
        }
    }
}

fn run_worker(shared: Arc<Shared>, sink_events: Receiver<SinkEvent>, shutdown: Receiver<()>, interval: Duration) {
    let ticker = channel::tick(interval);
    loop {
        select! {
            recv(ticker) -> _ => match shared.progress() {
                Some(progress) => shared.observers.emit_elapsed(&progress),
                None => break,
            },
            recv(sink_events) -> event => {
                let reason = match event {
                    Ok(SinkEvent::Drained) => StopReason::Finished,
                    Ok(SinkEvent::Failed(message)) => StopReason::Failed(message),
                    // A sink dropping its sender unprompted has lost its delivery thread.
                    Err(_) => StopReason::Failed(SINK_DISCONNECTED.to_string()),
                };
                if shared.teardown() {
                    log::info!("Playback ended: {:?}", reason);
                    shared.observers.emit_stopped(&reason);
                }
                break;
            }
            recv(shutdown) -> _ => break,
        }
    }
}
