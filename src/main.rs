//! riffplay - play a RIFF/WAVE file from the command line.
//!
//! ```bash
//! riffplay song.wav
//! riffplay --seek 01:30 --volume 0.5 song.wav
//! RUST_LOG=debug riffplay --null song.wav
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam::channel;

use riffplay::audio::{CpalSink, NullSink, OutputSink};
use riffplay::core::time;
use riffplay::decode::DecoderRegistry;
use riffplay::{Playback, PlaybackConfig, StopReason};

#[derive(Parser, Debug)]
#[command(name = "riffplay")]
#[command(about = "Play RIFF/WAVE audio files", long_about = None)]
struct Args {
    /// Audio file to play
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Start position as MM:SS
    #[arg(short, long)]
    seek: Option<String>,

    /// Volume between 0.0 and 1.0
    #[arg(short, long)]
    volume: Option<f32>,

    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Discard audio instead of opening a device
    #[arg(long)]
    null: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PlaybackConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => PlaybackConfig::default(),
    }
    .apply_env()?;

    let registry = DecoderRegistry::with_defaults(config.parse_options());
    let sink: Box<dyn OutputSink> = if args.null {
        Box::new(NullSink::new())
    } else {
        Box::new(CpalSink::new())
    };

    let mut playback = Playback::open(&args.file, &registry, sink, config)
        .with_context(|| format!("opening {}", args.file.display()))?;

    let (stopped_tx, stopped_rx) = channel::bounded(1);
    playback.on_elapsed(|progress| {
        log::info!(
            "{} / {} [{}]",
            time::format_time(progress.current_time),
            time::format_time(progress.total_duration),
            progress.state
        );
    });
    playback.on_stopped(move |reason| {
        let _ = stopped_tx.try_send(reason.clone());
    });

    if let Some(volume) = args.volume {
        playback.set_volume(volume);
    }
    if let Some(position) = &args.seek {
        playback.seek(position)?;
    }

    playback.play()?;
    let reason = stopped_rx.recv().context("playback ended without a stop notification")?;
    match reason {
        StopReason::Failed(message) => anyhow::bail!("playback failed: {}", message),
        reason => log::info!("Stopped: {:?}", reason),
    }
    Ok(())
}
