//! Resolves a file path to a decoder.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::decode::decoder::{AudioSource, DecodeError};
use crate::decode::wave::WaveDecoder;
use crate::riff::ParseOptions;

/// Anything that can turn a path into an audio source.
pub trait DecoderProvider {
    fn decoder_for(&self, path: &Path) -> Result<Arc<dyn AudioSource>, DecodeError>;
}

/// Builds a decoder for one file
pub type DecoderFactory = Box<dyn Fn(&Path) -> Result<Arc<dyn AudioSource>, DecodeError> + Send + Sync>;

/// Extension-keyed decoder lookup. Extensions are matched case-insensitively.
pub struct DecoderRegistry {
    factories: HashMap<String, DecoderFactory>,
}

impl DecoderRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry that knows `.wav` and `.wave`
    pub fn with_defaults(options: ParseOptions) -> Self {
        let mut registry = Self::new();
        for ext in ["wav", "wave"] {
            registry.register(
                ext,
                Box::new(move |path: &Path| -> Result<Arc<dyn AudioSource>, DecodeError> {
                    let decoder = WaveDecoder::open_with(path, options)?;
                    Ok(Arc::new(decoder))
                }),
            );
        }
        registry
    }

    /// Register a factory, replacing any previous one for the extension
    pub fn register(&mut self, extension: &str, factory: DecoderFactory) {
        self.factories
            .insert(extension.trim_start_matches('.').to_ascii_lowercase(), factory);
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults(ParseOptions::default())
    }
}

impl DecoderProvider for DecoderRegistry {
    fn decoder_for(&self, path: &Path) -> Result<Arc<dyn AudioSource>, DecodeError> {
        let factory = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.factories.get(&ext.to_ascii_lowercase()))
            .ok_or_else(|| DecodeError::Unsupported(path.to_path_buf()))?;

        let source = factory(path)?;
        log::info!("{} selected for {}", source.name(), path.display());
        Ok(source)
    }
}
