//! Player configuration: defaults, TOML files and environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::riff::{ChunkAlignment, ParseOptions};

pub const ENV_PROGRESS_MS: &str = "RIFFPLAY_PROGRESS_MS";
pub const ENV_ALIGNMENT: &str = "RIFFPLAY_ALIGNMENT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Interval between `elapsed` notifications
    pub progress_interval_ms: u64,
    /// Sink volume applied when a session is created
    pub initial_volume: f32,
    /// How the parser skips unknown chunks
    pub alignment: ChunkAlignment,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 200,
            initial_volume: 1.0,
            alignment: ChunkAlignment::Packed,
        }
    }
}

impl PlaybackConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            alignment: self.alignment,
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Override fields from `RIFFPLAY_PROGRESS_MS` and `RIFFPLAY_ALIGNMENT`
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_PROGRESS_MS) {
            self.progress_interval_ms = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{} must be an integer, got {:?}", ENV_PROGRESS_MS, value)))?;
        }
        if let Some(value) = lookup(ENV_ALIGNMENT) {
            self.alignment = match value.trim().to_ascii_lowercase().as_str() {
                "packed" => ChunkAlignment::Packed,
                "word" | "word_aligned" => ChunkAlignment::WordAligned,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "{} must be \"packed\" or \"word\", got {:?}",
                        ENV_ALIGNMENT, other
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_interval_ms == 0 {
            return Err(ConfigError::Invalid("progress_interval_ms must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(ConfigError::Invalid(format!(
                "initial_volume must be within [0, 1], got {}",
                self.initial_volume
            )));
        }
        Ok(())
    }
}
