use std::borrow::Cow;

use nom::bytes::complete::take;
use nom::number::complete::le_u32;
use nom::{Err, Finish, IResult};
use rusticata_macros::align32;

use crate::ScrubError;

/// An Enhanced Packet Block (EPB) is the standard container for packets
/// coming from the network.
///
/// The pristine raw body is retained next to the parsed fields. Byte
/// substitution mutates the raw body, and encoding always emits the raw body
/// rather than reassembling it from the parsed fields. Substitution rules
/// therefore scan the whole body, the fixed header region included; the
/// parsed fields keep their pre-substitution values.
#[derive(Debug)]
pub struct EnhancedPacketBlock<'a> {
    pub if_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    /// Captured packet length
    pub caplen: u32,
    /// Original packet length
    pub origlen: u32,
    /// Raw block body: fixed fields, packet data and padding
    pub(crate) raw: Cow<'a, [u8]>,
}

impl<'a> EnhancedPacketBlock<'a> {
    /// Decode an enhanced packet from a framed block body
    pub(crate) fn decode(body: &'a [u8]) -> Result<EnhancedPacketBlock<'a>, ScrubError<&'a [u8]>> {
        let (_rem, epb) = parse_enhancedpacket_body(body).finish()?;
        Ok(epb)
    }

    /// Packet timestamp as a single 64-bit value
    #[inline]
    pub fn timestamp(&self) -> u64 {
        (u64::from(self.ts_high) << 32) | u64::from(self.ts_low)
    }

    /// Returns true if the packet was truncated during capture
    #[inline]
    pub fn truncated(&self) -> bool {
        self.origlen != self.caplen
    }

    /// Captured packet bytes, without padding
    ///
    /// Clamped to the body end if the raw body has been mutated to a shorter
    /// length than the captured length field declares.
    pub fn packet_data(&self) -> &[u8] {
        let start = usize::min(20, self.raw.len());
        let end = usize::min(20 + self.caplen as usize, self.raw.len());
        &self.raw[start..end]
    }

    /// Return the raw block body
    #[inline]
    pub fn raw_body(&self) -> &[u8] {
        &self.raw
    }

    /// Replace the raw block body
    pub(crate) fn set_raw_body(&mut self, data: Vec<u8>) {
        self.raw = Cow::Owned(data);
    }
}

/// Parse an Enhanced Packet Block body (little-endian, envelope removed)
pub fn parse_enhancedpacket_body(
    i: &[u8],
) -> IResult<&[u8], EnhancedPacketBlock, ScrubError<&[u8]>> {
    if i.len() < 20 {
        return Err(Err::Error(ScrubError::MalformedEnvelope));
    }
    let raw = i;
    let (i, if_id) = le_u32(i)?;
    let (i, ts_high) = le_u32(i)?;
    let (i, ts_low) = le_u32(i)?;
    let (i, caplen) = le_u32(i)?;
    let (i, origlen) = le_u32(i)?;
    // align32 can overflow
    if caplen >= u32::MAX - 4 {
        return Err(Err::Error(ScrubError::TruncatedStream));
    }
    let padded = align32!(caplen) as usize;
    if padded > i.len() {
        return Err(Err::Error(ScrubError::TruncatedStream));
    }
    let (i, _data) = take(padded)(i)?;
    let block = EnhancedPacketBlock {
        if_id,
        ts_high,
        ts_low,
        caplen,
        origlen,
        raw: Cow::Borrowed(raw),
    };
    Ok((&i[i.len()..], block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // body of an EPB carrying a 14-byte payload (2 padding bytes)
    const EPB_BODY: &[u8] = &hex!(
        "
        00 00 00 00 00 00 00 00 01 00 00 00 0e 00 00 00
        0e 00 00 00 de ad be ef aa bb cc dd ee ff 01 02
        03 04 00 00"
    );

    #[test]
    fn decode_enhanced_packet() {
        let epb = EnhancedPacketBlock::decode(EPB_BODY).expect("decoding failed");
        assert_eq!(epb.if_id, 0);
        assert_eq!(epb.timestamp(), 1);
        assert_eq!(epb.caplen, 14);
        assert_eq!(epb.origlen, 14);
        assert!(!epb.truncated());
        assert_eq!(epb.packet_data().len(), 14);
        assert_eq!(&epb.packet_data()[..4], &hex!("de ad be ef"));
        assert_eq!(epb.raw_body(), EPB_BODY);
    }

    #[test]
    fn reject_payload_overrunning_body() {
        // caplen is 64 but the body only holds 16 payload bytes
        let body = hex!(
            "
            00 00 00 00 00 00 00 00 01 00 00 00 40 00 00 00
            40 00 00 00 de ad be ef aa bb cc dd ee ff 01 02
            03 04 00 00"
        );
        assert!(matches!(
            EnhancedPacketBlock::decode(&body),
            Err(ScrubError::TruncatedStream)
        ));
    }

    #[test]
    fn reject_short_body() {
        let body = hex!("00 00 00 00 00 00 00 00");
        assert!(matches!(
            EnhancedPacketBlock::decode(&body),
            Err(ScrubError::MalformedEnvelope)
        ));
    }
}
