use nom::number::complete::{le_u16, le_u32};
use nom::{Err, Finish, IResult};

use crate::{Linktype, ScrubError};

/// An Interface Description Block (IDB) describes an interface on which
/// packet data is captured.
///
/// Trailing options (`if_tsresol`, `if_name`, ...) are not interpreted. The
/// pristine body is kept and re-emitted verbatim on encode, so the
/// limitation does not affect round-trip fidelity.
#[derive(Debug)]
pub struct InterfaceDescriptionBlock<'a> {
    pub linktype: Linktype,
    pub reserved: u16,
    pub snaplen: u32,
    /// Pristine block body, unparsed trailing bytes included
    pub(crate) raw: &'a [u8],
}

impl<'a> InterfaceDescriptionBlock<'a> {
    /// Decode an interface description from a framed block body
    pub(crate) fn decode(
        body: &'a [u8],
    ) -> Result<InterfaceDescriptionBlock<'a>, ScrubError<&'a [u8]>> {
        let (_rem, idb) = parse_interfacedescription_body(body).finish()?;
        Ok(idb)
    }

    /// Return the pristine block body
    #[inline]
    pub fn raw_body(&self) -> &[u8] {
        self.raw
    }
}

/// Parse an Interface Description Block body (little-endian, envelope removed)
pub fn parse_interfacedescription_body(
    i: &[u8],
) -> IResult<&[u8], InterfaceDescriptionBlock, ScrubError<&[u8]>> {
    if i.len() < 8 {
        return Err(Err::Error(ScrubError::MalformedEnvelope));
    }
    let raw = i;
    let (i, linktype) = le_u16(i)?;
    let (i, reserved) = le_u16(i)?;
    let (i, snaplen) = le_u32(i)?;
    let block = InterfaceDescriptionBlock {
        linktype: Linktype(i32::from(linktype)),
        reserved,
        snaplen,
        raw,
    };
    Ok((&i[i.len()..], block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn decode_interface_description() {
        let body = hex!("01 00 00 00 ff ff 00 00");
        let idb = InterfaceDescriptionBlock::decode(&body).expect("decoding failed");
        assert_eq!(idb.linktype, Linktype::ETHERNET);
        assert_eq!(idb.reserved, 0);
        assert_eq!(idb.snaplen, 65535);
        assert_eq!(idb.raw_body(), &body);
    }

    #[test]
    fn trailing_option_bytes_are_kept_opaque() {
        let body = hex!(
            "65 00 00 00 00 00 04 00"
            "09 00 01 00 06 00 00 00 00 00 00 00"
        );
        let idb = InterfaceDescriptionBlock::decode(&body).expect("decoding failed");
        assert_eq!(idb.linktype, Linktype(101));
        assert_eq!(idb.snaplen, 0x0004_0000);
        assert_eq!(idb.raw_body(), &body);
    }

    #[test]
    fn reject_short_body() {
        let body = hex!("01 00 00 00");
        assert!(matches!(
            InterfaceDescriptionBlock::decode(&body),
            Err(ScrubError::MalformedEnvelope)
        ));
    }
}
