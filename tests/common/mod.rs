//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::Sender;
use parking_lot::Mutex;
use tempfile::TempDir;

use riffplay::audio::{OutputSink, SinkError, SinkEvent};
use riffplay::decode::AudioSource;
use riffplay::PlaybackState;

/// Builds RIFF/WAVE byte streams chunk by chunk
pub struct WavBuilder {
    channels: u16,
    sample_rate: u32,
    bits: u16,
    before_data: Vec<([u8; 4], Vec<u8>)>,
    data: Vec<u8>,
}

impl WavBuilder {
    pub fn new(channels: u16, sample_rate: u32, bits: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bits,
            before_data: Vec::new(),
            data: Vec::new(),
        }
    }

    /// One second of 8 kHz mono 8-bit audio: 8000 data bytes
    pub fn one_second_8k() -> Self {
        Self::new(1, 8000, 8).data((0..8000u32).map(|i| (i % 256) as u8).collect())
    }

    pub fn data(mut self, bytes: Vec<u8>) -> Self {
        self.data = bytes;
        self
    }

    /// Insert an extra chunk between `fmt ` and `data`, written without padding
    pub fn chunk(mut self, id: &[u8; 4], payload: Vec<u8>) -> Self {
        self.before_data.push((*id, payload));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let block_align = self.channels * self.bits.div_ceil(8);
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&1u16.to_le_bytes());
        fmt.extend_from_slice(&self.channels.to_le_bytes());
        fmt.extend_from_slice(&self.sample_rate.to_le_bytes());
        fmt.extend_from_slice(&(self.sample_rate * block_align as u32).to_le_bytes());
        fmt.extend_from_slice(&block_align.to_le_bytes());
        fmt.extend_from_slice(&self.bits.to_le_bytes());

        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");
        push_chunk(&mut body, b"fmt ", &fmt);
        for (id, payload) in &self.before_data {
            push_chunk(&mut body, id, payload);
        }
        push_chunk(&mut body, b"data", &self.data);

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }
}

fn push_chunk(out: &mut Vec<u8>, id: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(id);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

/// Temporary directory holding fixture files
pub struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

#[derive(Default)]
struct ManualInner {
    source: Option<Arc<dyn AudioSource>>,
    events: Option<Sender<SinkEvent>>,
    state: PlaybackState,
    volume: f32,
}

/// Test side of a [`ManualSink`]: pulls bytes on demand
#[derive(Clone, Default)]
pub struct ManualHandle {
    inner: Arc<Mutex<ManualInner>>,
    stops: Arc<AtomicUsize>,
}

impl ManualHandle {
    /// Pull up to `len` bytes if playing. An empty read reports `Drained`.
    pub fn pump(&self, len: usize) -> usize {
        let mut inner = self.inner.lock();
        if !inner.state.is_playing() {
            return 0;
        }
        let Some(source) = inner.source.clone() else {
            return 0;
        };
        let mut buffer = vec![0u8; len];
        let read = source.read(&mut buffer, len).unwrap();
        if read == 0 {
            inner.state = PlaybackState::Stopped;
            if let Some(events) = &inner.events {
                events.send(SinkEvent::Drained).unwrap();
            }
        }
        read
    }

    pub fn fail(&self, message: &str) {
        if let Some(events) = &self.inner.lock().events {
            events.send(SinkEvent::Failed(message.to_string())).unwrap();
        }
    }

    /// Drop the event sender without reporting anything, as a sink whose
    /// delivery thread died would
    pub fn disconnect(&self) {
        self.inner.lock().events = None;
    }

    pub fn holds_source(&self) -> bool {
        self.inner.lock().source.is_some()
    }

    pub fn stop_calls(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().volume
    }
}

/// A sink driven by the test instead of a device clock
pub struct ManualSink {
    handle: ManualHandle,
}

impl ManualSink {
    pub fn new() -> (Self, ManualHandle) {
        let handle = ManualHandle::default();
        handle.inner.lock().volume = 1.0;
        (Self { handle: handle.clone() }, handle)
    }
}

impl OutputSink for ManualSink {
    fn init(&mut self, source: Arc<dyn AudioSource>, events: Sender<SinkEvent>) -> Result<(), SinkError> {
        let mut inner = self.handle.inner.lock();
        inner.source = Some(source);
        inner.events = Some(events);
        Ok(())
    }

    fn play(&mut self) -> Result<(), SinkError> {
        let mut inner = self.handle.inner.lock();
        if inner.source.is_none() {
            return Err(SinkError::NotInitialized);
        }
        inner.state = PlaybackState::Playing;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SinkError> {
        self.handle.inner.lock().state = PlaybackState::Paused;
        Ok(())
    }

    fn stop(&mut self) {
        let mut inner = self.handle.inner.lock();
        inner.source = None;
        inner.events = None;
        inner.state = PlaybackState::Stopped;
        self.handle.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn state(&self) -> PlaybackState {
        self.handle.inner.lock().state
    }

    fn volume(&self) -> f32 {
        self.handle.inner.lock().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.handle.inner.lock().volume = volume.clamp(0.0, 1.0);
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
