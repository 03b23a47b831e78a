//! RIFF/WAVE container parsing.
//!
//! The parser reads the 12-byte RIFF header, then walks chunks until it finds
//! `fmt ` and afterwards `data`, skipping any other chunk (`LIST`, `fact`,
//! vendor chunks) on the way. The whole sample payload is loaded into memory.

pub mod chunk;
pub mod container;
pub mod parser;

pub use chunk::{ChunkAlignment, ChunkHeader, FourCc};
pub use container::{AudioContainer, DataChunk, FormatChunk, RiffHeader};
pub use parser::{parse, parse_file, ParseOptions};
