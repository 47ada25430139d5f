use std::io::{Read, Write};

use cookie_factory::GenError;
use thiserror::Error;
use tracing::{debug, trace};

use crate::pcapng::{decode_block, Block, RawBlockReader};
use crate::serialize::ToVec;
use crate::transform::{self, TransformConfig};
use crate::ScrubError;

/// Default streaming buffer capacity, in bytes
pub const DEFAULT_BUFFER_CAPACITY: usize = 65536;

// Hard limit on buffer growth when a single block exceeds the capacity.
const MAX_BUFFER_CAPACITY: usize = 64 * 1024 * 1024;

/// Counters reported after a completed run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrubStats {
    pub blocks: usize,
    pub sections: usize,
    pub interfaces: usize,
    pub packets: usize,
    pub bytes_written: usize,
}

/// A failed run
///
/// Any decode, encode or I/O failure aborts the run immediately; there is no
/// skip-and-continue and no partial-output recovery.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("decode failed: {0}")]
    Decode(ScrubError<&'static [u8]>),
    #[error("encode failed: {0:?}")]
    Encode(GenError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ScrubError<&'static [u8]>> for PipelineError {
    fn from(e: ScrubError<&'static [u8]>) -> Self {
        PipelineError::Decode(e)
    }
}

impl From<GenError> for PipelineError {
    fn from(e: GenError) -> Self {
        PipelineError::Encode(e)
    }
}

/// Rewrite a capture stream, applying the configured transforms
///
/// Blocks are processed one at a time, in input order: frame, decode via the
/// block registry, redact, substitute, encode, write. The run stops cleanly
/// at end of stream and aborts on the first error.
pub fn scrub<R: Read, W: Write>(
    input: R,
    output: &mut W,
    config: &TransformConfig,
) -> Result<ScrubStats, PipelineError> {
    let mut reader = RawBlockReader::new(DEFAULT_BUFFER_CAPACITY, input)?;
    let mut stats = ScrubStats::default();
    loop {
        match reader.next() {
            Ok((offset, raw)) => {
                let mut block = match decode_block(&raw) {
                    Ok(b) => b,
                    Err(e) => return Err(PipelineError::Decode(e.to_static())),
                };
                transform::apply(&mut block, config);
                let bytes = block.to_vec()?;
                trace!(
                    "block type {:#010x}, {} bytes out",
                    block.magic(),
                    bytes.len()
                );
                match &block {
                    Block::SectionHeader(_) => stats.sections += 1,
                    Block::InterfaceDescription(_) => stats.interfaces += 1,
                    Block::EnhancedPacket(_) => stats.packets += 1,
                }
                output.write_all(&bytes)?;
                stats.blocks += 1;
                stats.bytes_written += bytes.len();
                reader.consume(offset);
            }
            Err(ScrubError::Eof) => break,
            Err(ScrubError::Incomplete(_)) => {
                if let Err(e) = reader.refill() {
                    let e = e.to_static();
                    return Err(PipelineError::Decode(e));
                }
            }
            Err(ScrubError::BufferTooSmall) => {
                let new_capacity = reader.capacity() * 2;
                if new_capacity > MAX_BUFFER_CAPACITY || !reader.grow(new_capacity) {
                    return Err(PipelineError::Decode(ScrubError::BufferTooSmall));
                }
            }
            Err(e) => {
                let e = e.to_static();
                return Err(PipelineError::Decode(e));
            }
        }
    }
    debug!(
        blocks = stats.blocks,
        sections = stats.sections,
        interfaces = stats.interfaces,
        packets = stats.packets,
        bytes = stats.bytes_written,
        "capture rewritten"
    );
    Ok(stats)
}
