pub mod decoder;
pub mod registry;
pub mod stream_info;
pub mod wave;

pub use decoder::{AudioSource, DecodeError};
pub use registry::{DecoderFactory, DecoderProvider, DecoderRegistry};
pub use stream_info::{SampleEncoding, WaveFormat};
pub use wave::WaveDecoder;
