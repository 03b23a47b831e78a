//! Pulls bytes from a source and turns them into output samples. Shared by
//! the sinks; runs on their delivery thread.

use std::sync::Arc;

use crossbeam::channel::Sender;

use crate::audio::convert;
use crate::audio::sink::{SharedGain, SinkEvent};
use crate::decode::{AudioSource, WaveFormat};

pub(crate) struct Feeder {
    source: Arc<dyn AudioSource>,
    format: WaveFormat,
    gain: Arc<SharedGain>,
    events: Sender<SinkEvent>,
    /// Raw bytes for one callback; grows to the largest request seen
    scratch: Vec<u8>,
    drained: bool,
}

impl Feeder {
    pub(crate) fn new(source: Arc<dyn AudioSource>, gain: Arc<SharedGain>, events: Sender<SinkEvent>) -> Self {
        let format = source.wave_format();
        Self {
            source,
            format,
            gain,
            events,
            scratch: Vec::new(),
            drained: false,
        }
    }

    pub(crate) fn format(&self) -> &WaveFormat {
        &self.format
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.drained
    }

    /// Fill an interleaved output buffer. Whatever the source cannot supply
    /// is silence. Reports `Drained` once, on the first empty read.
    pub(crate) fn fill(&mut self, out: &mut [f32]) -> usize {
        if self.drained {
            out.fill(0.0);
            return 0;
        }

        let channels = self.format.channels.max(1) as usize;
        let frames = out.len() / channels;
        let wanted = frames * channels * self.format.bytes_per_sample();
        if wanted == 0 {
            // Nothing to ask for; an empty read here is not end of data.
            out.fill(0.0);
            return 0;
        }
        if self.scratch.len() < wanted {
            self.scratch.resize(wanted, 0);
        }

        let read = match self.source.read(&mut self.scratch, wanted) {
            Ok(n) => n,
            Err(e) => {
                log::error!("{} read failed: {}", self.source.name(), e);
                self.drained = true;
                let _ = self.events.send(SinkEvent::Failed(e.to_string()));
                out.fill(0.0);
                return 0;
            }
        };

        let written = convert::to_f32(&self.format, &self.scratch[..read], out);
        let gain = self.gain.get();
        if gain != 1.0 {
            for sample in &mut out[..written] {
                *sample *= gain;
            }
        }
        out[written..].fill(0.0);

        if read == 0 {
            self.drained = true;
            let _ = self.events.send(SinkEvent::Drained);
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::WaveDecoder;
    use crate::riff::{AudioContainer, DataChunk, FormatChunk, FourCc, RiffHeader};
    use crossbeam::channel;

    fn source(data: Vec<u8>) -> Arc<dyn AudioSource> {
        // 8 kHz mono unsigned 8-bit
        source_with(1, 8, data)
    }

    fn source_with(channels: u16, bits: u16, data: Vec<u8>) -> Arc<dyn AudioSource> {
        let block_align = channels * bits.div_ceil(8);
        let mut body = [0u8; 16];
        body[0..2].copy_from_slice(&1u16.to_le_bytes());
        body[2..4].copy_from_slice(&channels.to_le_bytes());
        body[4..8].copy_from_slice(&8000u32.to_le_bytes());
        body[8..12].copy_from_slice(&(8000 * block_align as u32).to_le_bytes());
        body[12..14].copy_from_slice(&block_align.to_le_bytes());
        body[14..16].copy_from_slice(&bits.to_le_bytes());
        let riff = RiffHeader::from_bytes(*b"RIFF\x00\x00\x00\x00WAVE").unwrap();
        let data = DataChunk {
            id: FourCc::DATA,
            size: data.len() as u32,
            bytes: data,
        };
        Arc::new(WaveDecoder::from_container(AudioContainer::new(
            riff,
            FormatChunk::from_bytes(16, body),
            data,
        )))
    }

    #[test]
    fn test_fill_then_drain() {
        let (tx, rx) = channel::unbounded();
        let src = source(vec![255; 6]);
        let mut feeder = Feeder::new(Arc::clone(&src), Arc::new(SharedGain::new(0.5)), tx);

        let mut out = [9.0f32; 4];
        assert_eq!(feeder.fill(&mut out), 4);
        let expected = 127.0 / 128.0 * 0.5;
        assert!(out.iter().all(|s| (s - expected).abs() < 1e-6));
        assert_eq!(src.position(), 4);

        // Short read: two samples then silence
        assert_eq!(feeder.fill(&mut out), 2);
        assert_eq!(&out[2..], &[0.0, 0.0]);
        assert!(rx.try_recv().is_err());

        assert_eq!(feeder.fill(&mut out), 0);
        assert!(feeder.is_drained());
        assert_eq!(rx.try_recv().unwrap(), SinkEvent::Drained);

        // Only reported once
        feeder.fill(&mut out);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_empty_request_is_not_end_of_data() {
        // Stereo output buffer shorter than one frame
        let (tx, rx) = channel::unbounded();
        let src = source_with(2, 16, vec![0; 64]);
        let mut feeder = Feeder::new(Arc::clone(&src), Arc::new(SharedGain::default()), tx);

        let mut out = [9.0f32; 1];
        assert_eq!(feeder.fill(&mut out), 0);
        assert_eq!(out, [0.0]);
        assert!(!feeder.is_drained());
        assert!(rx.try_recv().is_err());
        assert_eq!(src.position(), 0);

        let mut out = [0.0f32; 4];
        assert_eq!(feeder.fill(&mut out), 4);
        assert_eq!(src.position(), 8);
    }

    #[test]
    fn test_zero_bit_format_is_not_end_of_data() {
        let (tx, rx) = channel::unbounded();
        let src = source_with(1, 0, vec![128; 16]);
        let mut feeder = Feeder::new(Arc::clone(&src), Arc::new(SharedGain::default()), tx);

        let mut out = [9.0f32; 8];
        assert_eq!(feeder.fill(&mut out), 0);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(!feeder.is_drained());
        assert!(rx.try_recv().is_err());
    }
}
