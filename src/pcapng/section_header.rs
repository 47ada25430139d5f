use nom::number::complete::{le_i64, le_u16, le_u32};
use nom::{Err, Finish, IResult};

use crate::pcapng::{parse_options, PcapNgOption, BOM_MAGIC};
use crate::ScrubError;

/// The Section Header Block (SHB) identifies the beginning of a section of
/// the capture file.
///
/// The option list carries section-level metadata (hardware, OS, capturing
/// application, comments) and may be cleared by redaction.
#[derive(Debug)]
pub struct SectionHeaderBlock<'a> {
    /// Byte-order magic; always equals [`BOM_MAGIC`] after a successful decode
    pub bom: u32,
    pub major_version: u16,
    pub minor_version: u16,
    /// Section length, -1 if unknown
    pub section_len: i64,
    pub options: Vec<PcapNgOption<'a>>,
}

impl<'a> SectionHeaderBlock<'a> {
    /// Decode a section header from a framed block body
    pub(crate) fn decode(body: &'a [u8]) -> Result<SectionHeaderBlock<'a>, ScrubError<&'a [u8]>> {
        let (_rem, shb) = parse_sectionheader_body(body).finish()?;
        Ok(shb)
    }
}

/// Parse a Section Header Block body (little-endian, envelope removed)
pub fn parse_sectionheader_body(i: &[u8]) -> IResult<&[u8], SectionHeaderBlock, ScrubError<&[u8]>> {
    if i.len() < 16 {
        return Err(Err::Error(ScrubError::MalformedEnvelope));
    }
    let (i, bom) = le_u32(i)?;
    if bom != BOM_MAGIC {
        return Err(Err::Error(ScrubError::InvalidMagic));
    }
    let (i, major_version) = le_u16(i)?;
    let (i, minor_version) = le_u16(i)?;
    let (i, section_len) = le_i64(i)?;
    let options = parse_options(i).map_err(Err::Error)?;
    let block = SectionHeaderBlock {
        bom,
        major_version,
        minor_version,
        section_len,
        options,
    };
    Ok((&i[i.len()..], block))
}
