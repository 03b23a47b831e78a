//! Chunk parser: RIFF header, then `fmt `, then `data`, skipping anything
//! else found on the way.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::FormatError;
use crate::riff::chunk::{self, ChunkAlignment, ChunkHeader, FourCc};
use crate::riff::container::{AudioContainer, DataChunk, FormatChunk, RiffHeader};

/// Options controlling how the chunk stream is walked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub alignment: ChunkAlignment,
}

/// Open and fully parse a WAVE file.
pub fn parse_file(path: &Path, options: ParseOptions) -> Result<AudioContainer, FormatError> {
    let file = File::open(path)?;
    let container = parse(&mut BufReader::new(file), options)?;
    log::info!(
        "Parsed {}: {} Hz, {} ch, {} bit, {} data bytes",
        path.display(),
        container.format().sample_rate,
        container.format().num_channels,
        container.format().bits_per_sample,
        container.data_len()
    );
    Ok(container)
}

/// Parse a WAVE stream positioned at offset 0.
pub fn parse<R: Read>(reader: &mut R, options: ParseOptions) -> Result<AudioContainer, FormatError> {
    let riff = read_riff_header(reader)?;
    let format = read_format_chunk(reader, options)?;
    let data = read_data_chunk(reader, options)?;
    Ok(AudioContainer::new(riff, format, data))
}

fn read_riff_header<R: Read>(reader: &mut R) -> Result<RiffHeader, FormatError> {
    let mut bytes = [0u8; RiffHeader::LEN];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| FormatError::from_read(e, "RIFF header"))?;
    RiffHeader::from_bytes(bytes)
}

/// Advance to the next chunk with the given id, skipping everything else.
fn find_chunk<R: Read>(
    reader: &mut R,
    wanted: FourCc,
    name: &'static str,
    options: ParseOptions,
) -> Result<ChunkHeader, FormatError> {
    loop {
        let header = ChunkHeader::read(reader)?.ok_or(FormatError::MissingChunk(name))?;
        log::debug!("chunk {:?} ({} bytes)", header.id, header.size);

        if header.id == wanted {
            return Ok(header);
        }
        chunk::skip(reader, options.alignment.padded_len(header.size), "skipped chunk")?;
    }
}

fn read_format_chunk<R: Read>(reader: &mut R, options: ParseOptions) -> Result<FormatChunk, FormatError> {
    let header = find_chunk(reader, FourCc::FMT, "fmt ", options)?;
    if (header.size as usize) < FormatChunk::FIXED_LEN {
        return Err(FormatError::InvalidFormat(format!(
            "fmt chunk is {} bytes, need at least {}",
            header.size,
            FormatChunk::FIXED_LEN
        )));
    }

    let mut body = [0u8; FormatChunk::FIXED_LEN];
    reader
        .read_exact(&mut body)
        .map_err(|e| FormatError::from_read(e, "fmt chunk"))?;

    let extension = options.alignment.padded_len(header.size) - FormatChunk::FIXED_LEN as u64;
    if extension > 0 {
        log::warn!("ignoring {} extension bytes in fmt chunk", extension);
        chunk::skip(reader, extension, "fmt chunk")?;
    }

    let format = FormatChunk::from_bytes(header.size, body);
    format.validate()?;

    if format.byte_rate as u64 != format.expected_byte_rate() {
        log::warn!(
            "byte rate {} does not match {} Hz x {} ch x {} bit; seeking uses the declared rate",
            format.byte_rate,
            format.sample_rate,
            format.num_channels,
            format.bits_per_sample
        );
    }
    Ok(format)
}

fn read_data_chunk<R: Read>(reader: &mut R, options: ParseOptions) -> Result<DataChunk, FormatError> {
    let header = find_chunk(reader, FourCc::DATA, "data", options)?;

    // Grow with the stream rather than trusting the declared size up front.
    let mut bytes = Vec::new();
    reader.by_ref().take(header.size as u64).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != header.size as u64 {
        return Err(FormatError::Truncated {
            context: "data chunk",
        });
    }

    Ok(DataChunk {
        id: header.id,
        size: header.size,
        bytes,
    })
}
