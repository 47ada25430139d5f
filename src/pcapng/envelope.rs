use nom::bytes::streaming::take;
use nom::number::streaming::le_u32;
use nom::{Err, IResult};

use crate::ScrubError;

/// A length-framed block whose body has not been interpreted yet
#[derive(Debug, PartialEq)]
pub struct RawBlock<'a> {
    /// Block type code, read as little-endian
    pub block_type: u32,
    /// Total block length, equal to `12 + body.len()`
    pub block_len: u32,
    /// Block body, without any envelope field
    pub body: &'a [u8],
}

impl<'a> RawBlock<'a> {
    /// Encoded size of the block, envelope included
    #[inline]
    pub fn size(&self) -> usize {
        12 + self.body.len()
    }
}

/// Parse the generic block envelope (little-endian)
///
/// Reads the type code and total length, exactly `total length - 12` body
/// bytes, then the trailing length copy. A total length below 12 or a
/// trailing copy differing from the leading one is a `MalformedEnvelope`
/// error. Streaming semantics: a short input yields `Incomplete`, the caller
/// decides whether that is end of stream or truncation.
pub fn parse_raw_block_le(i: &[u8]) -> IResult<&[u8], RawBlock, ScrubError<&[u8]>> {
    let (i, block_type) = le_u32(i)?;
    let (i, block_len) = le_u32(i)?;
    // 12 is block_type (4) + leading length (4) + trailing length (4)
    if block_len < 12 {
        return Err(Err::Error(ScrubError::MalformedEnvelope));
    }
    let (i, body) = take(block_len - 12)(i)?;
    let (i, block_len2) = le_u32(i)?;
    if block_len2 != block_len {
        return Err(Err::Error(ScrubError::MalformedEnvelope));
    }
    Ok((
        i,
        RawBlock {
            block_type,
            block_len,
            body,
        },
    ))
}
