//! Error taxonomy shared by the parser, the decoder and the controller.

use std::io;

/// Malformed or truncated input: the container itself or a seek-time string.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("not a RIFF file (found tag {found:?})")]
    NotRiff { found: String },
    #[error("RIFF form is {found:?}, expected \"WAVE\"")]
    NotWave { found: String },
    #[error("unexpected end of stream while reading {context}")]
    Truncated { context: &'static str },
    #[error("no {0:?} chunk before end of stream")]
    MissingChunk(&'static str),
    #[error("invalid format chunk: {0}")]
    InvalidFormat(String),
    #[error("seek time {input:?} is not in MM:SS form")]
    InvalidSeekTime { input: String },
}

impl FormatError {
    /// Map an I/O failure during parsing, turning EOF into `Truncated`.
    pub(crate) fn from_read(err: io::Error, context: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::Truncated { context }
        } else {
            FormatError::Io(err)
        }
    }
}

/// A cursor position or read request outside `[0, length]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("position {requested} is outside the data range [0, {length}]")]
pub struct BoundsError {
    pub requested: u64,
    pub length: u64,
}
