use std::io::Write;

use cookie_factory::bytes::{le_i64, le_u16, le_u32};
use cookie_factory::combinator::slice;
use cookie_factory::multi::many_ref;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen, GenError, SerializeFn};
use rusticata_macros::align32;

use crate::pcapng::*;

/// Common trait for block serialization (little-endian)
pub trait ToVec {
    /// Serialize the full block, envelope included
    ///
    /// The envelope length is always recomputed from the body, never taken
    /// from a stored value, so a mutated body yields a self-consistent block.
    fn to_vec(&self) -> Result<Vec<u8>, GenError> {
        let body = self.body_to_vec()?;
        encode_envelope_le(self.block_type(), &body)
    }

    /// Type code written in the envelope
    fn block_type(&self) -> u32;

    /// Serialize the block body, without the envelope
    fn body_to_vec(&self) -> Result<Vec<u8>, GenError>;
}

/// Wrap a body in the generic block envelope (little-endian)
///
/// Writes the type code, `12 + body.len()` as total length, the body, and
/// the total length again.
pub fn encode_envelope_le(block_type: u32, body: &[u8]) -> Result<Vec<u8>, GenError> {
    let total_len = 12 + body.len() as u32;
    let mut v = Vec::with_capacity(total_len as usize);
    gen(
        tuple((
            le_u32(block_type),
            le_u32(total_len),
            slice(body),
            le_u32(total_len),
        )),
        &mut v,
    )
    .map(|res| res.0.to_vec())
}

fn padding_for<'a, W: Write + 'a>(unaligned_length: u32) -> impl SerializeFn<W> + 'a {
    let length = align32!(unaligned_length) - unaligned_length;
    slice(if length > 0 {
        &[0, 0, 0, 0][..length as usize]
    } else {
        b""
    })
}

fn pcapng_option_le<'a, 'b: 'a, W: Write + 'a>(o: &'b PcapNgOption) -> impl SerializeFn<W> + 'a {
    tuple((
        le_u16(o.code.0),
        le_u16(o.len),
        slice(&o.value),
        padding_for(o.value.len() as u32),
    ))
}

fn options_length(options: &[PcapNgOption]) -> usize {
    options.iter().map(|o| align32!(4 + o.value.len())).sum()
}

// A non-empty option list needs an end-of-options terminator; an empty list
// gets no option bytes at all.
fn end_of_options<'a, W: Write + 'a>(options: &[PcapNgOption]) -> impl SerializeFn<W> + 'a {
    slice(if options.is_empty() {
        b"" as &[u8]
    } else {
        &[0, 0, 0, 0]
    })
}

impl<'a> ToVec for SectionHeaderBlock<'a> {
    fn block_type(&self) -> u32 {
        SHB_MAGIC
    }

    fn body_to_vec(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(16 + options_length(&self.options) + 4);
        gen(
            tuple((
                le_u32(self.bom),
                le_u16(self.major_version),
                le_u16(self.minor_version),
                le_i64(self.section_len),
                many_ref(&self.options, pcapng_option_le),
                end_of_options(&self.options),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for InterfaceDescriptionBlock<'a> {
    fn block_type(&self) -> u32 {
        IDB_MAGIC
    }

    /// The pristine body is emitted verbatim; trailing options are not
    /// reassembled from parsed fields.
    fn body_to_vec(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(self.raw.len());
        gen(slice(self.raw), &mut v).map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for EnhancedPacketBlock<'a> {
    fn block_type(&self) -> u32 {
        EPB_MAGIC
    }

    /// The raw body is emitted as-is, substituted or pristine; the parsed
    /// fields are never re-packed.
    fn body_to_vec(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(self.raw.len());
        gen(slice(self.raw.as_ref()), &mut v).map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for Block<'a> {
    fn block_type(&self) -> u32 {
        self.magic()
    }

    fn body_to_vec(&self) -> Result<Vec<u8>, GenError> {
        match self {
            Block::SectionHeader(b) => b.body_to_vec(),
            Block::InterfaceDescription(b) => b.body_to_vec(),
            Block::EnhancedPacket(b) => b.body_to_vec(),
        }
    }
}
