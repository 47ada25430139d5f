//! PCAPNG block codec
//!
//! See <https://github.com/pcapng/pcapng> for the format description.
//!
//! A capture file is a sequence of blocks, each wrapped in a generic
//! envelope: a 4-byte type code, a total length, the body, and a trailing
//! copy of the total length. [`parse_raw_block_le`] frames a [`RawBlock`]
//! from the envelope without interpreting the body; [`decode_block`] then
//! dispatches the body to the decoder registered for the type code.
//!
//! Three block kinds are supported: Section Header, Interface Description
//! and Enhanced Packet. Any other type code is rejected with
//! [`ScrubError::UnsupportedBlockType`](crate::ScrubError::UnsupportedBlockType).
//!
//! Only little-endian captures are supported: a section header whose
//! byte-order magic does not read as [`BOM_MAGIC`] in little-endian fails to
//! decode.
//!
//! For streaming input, [`RawBlockReader`] frames blocks from any
//! [`Read`](std::io::Read) source with constant memory usage.

use crate::ScrubError;

mod envelope;
mod enhanced_packet;
mod interface_description;
mod option;
mod reader;
mod section_header;

pub use envelope::*;
pub use enhanced_packet::*;
pub use interface_description::*;
pub use option::*;
pub use reader::*;
pub use section_header::*;

/// Section Header Block magic
pub const SHB_MAGIC: u32 = 0x0A0D_0D0A;
/// Interface Description Block magic
pub const IDB_MAGIC: u32 = 0x0000_0001;
/// Enhanced Packet Block magic
pub const EPB_MAGIC: u32 = 0x0000_0006;

/// Byte Order magic
pub const BOM_MAGIC: u32 = 0x1A2B_3C4D;

/// A decoded block from a PCAPNG capture
#[derive(Debug)]
pub enum Block<'a> {
    SectionHeader(SectionHeaderBlock<'a>),
    InterfaceDescription(InterfaceDescriptionBlock<'a>),
    EnhancedPacket(EnhancedPacketBlock<'a>),
}

impl<'a> Block<'a> {
    /// Return the magic number of the block
    pub fn magic(&self) -> u32 {
        match self {
            Block::SectionHeader(_) => SHB_MAGIC,
            Block::InterfaceDescription(_) => IDB_MAGIC,
            Block::EnhancedPacket(_) => EPB_MAGIC,
        }
    }

    /// Returns true if the block contains a network packet
    pub fn is_data_block(&self) -> bool {
        matches!(self, Block::EnhancedPacket(_))
    }
}

/// Decode a framed block body using the registered block kinds
///
/// The registry is closed: exactly three type codes are mapped, and any
/// other code fails with `UnsupportedBlockType`. New block kinds are added
/// here, with a new `Block` variant and decoder/encoder pair, without
/// touching the envelope framer.
pub fn decode_block<'a>(raw: &RawBlock<'a>) -> Result<Block<'a>, ScrubError<&'a [u8]>> {
    match raw.block_type {
        SHB_MAGIC => SectionHeaderBlock::decode(raw.body).map(Block::SectionHeader),
        IDB_MAGIC => InterfaceDescriptionBlock::decode(raw.body).map(Block::InterfaceDescription),
        EPB_MAGIC => EnhancedPacketBlock::decode(raw.body).map(Block::EnhancedPacket),
        other => Err(ScrubError::UnsupportedBlockType(other)),
    }
}
