use std::borrow::Cow;

use nom::bytes::complete::take;
use nom::number::complete::le_u16;
use nom::{Err, IResult};
use rusticata_macros::{align32, newtype_enum};

use crate::ScrubError;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct OptionCode(pub u16);

newtype_enum! {
impl debug OptionCode {
    EndOfOpt = 0,
    Comment = 1,
    ShbHardware = 2,
    ShbOs = 3,
    ShbUserAppl = 4,
}
}

/// A TLV option nested in a block body
///
/// The value keeps the exact source byte range, padding included, so that an
/// unmodified option re-encodes to the same bytes it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct PcapNgOption<'a> {
    pub code: OptionCode,
    /// Declared value length, without padding
    pub len: u16,
    /// Raw value bytes as read from the source, padding included
    pub value: Cow<'a, [u8]>,
}

impl<'a> PcapNgOption<'a> {
    /// Return the raw option value, padding included
    #[inline]
    pub fn value(&self) -> &[u8] {
        self.value.as_ref()
    }

    /// Return the option value limited to the declared length, or None if the
    /// declared length is invalid
    pub fn as_bytes(&self) -> Option<&[u8]> {
        let len = usize::from(self.len);
        if len <= self.value.len() {
            Some(&self.value[..len])
        } else {
            None
        }
    }

    /// Encoded size of the option: 4-byte header plus value and padding
    #[inline]
    pub fn size(&self) -> usize {
        4 + align32!(usize::from(self.len))
    }
}

/// Parse a single option (little-endian)
///
/// The value is read up to the next 4-byte boundary, so the returned option
/// covers its full source byte range. A declared length larger than the
/// remaining buffer is a `TruncatedOption` error.
pub(crate) fn parse_option<'i>(i: &'i [u8]) -> IResult<&'i [u8], PcapNgOption<'i>, ScrubError<&'i [u8]>> {
    if i.len() < 4 {
        return Err(Err::Error(ScrubError::TruncatedOption));
    }
    let (i, code) = le_u16(i)?;
    let (i, len) = le_u16(i)?;
    if usize::from(len) > i.len() {
        return Err(Err::Error(ScrubError::TruncatedOption));
    }
    // the final option of a block may lack padding at the end of the buffer
    let padded = usize::min(align32!(usize::from(len)), i.len());
    let (i, value) = take(padded)(i)?;
    let option = PcapNgOption {
        code: OptionCode(code),
        len,
        value: Cow::Borrowed(value),
    };
    Ok((i, option))
}

/// Lazy decoder over an option list
///
/// Iteration ends at buffer exhaustion or at an end-of-options terminator.
/// The terminator is consumed but not yielded.
pub struct OptionsIter<'a> {
    rem: &'a [u8],
    done: bool,
}

impl<'a> Iterator for OptionsIter<'a> {
    type Item = Result<PcapNgOption<'a>, ScrubError<&'a [u8]>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.rem.is_empty() {
            return None;
        }
        match parse_option(self.rem) {
            Ok((rem, option)) => {
                self.rem = rem;
                if option.code == OptionCode::EndOfOpt {
                    self.done = true;
                    None
                } else {
                    Some(Ok(option))
                }
            }
            Err(Err::Error(e)) | Err(Err::Failure(e)) => {
                self.done = true;
                Some(Err(e))
            }
            Err(Err::Incomplete(_)) => {
                self.done = true;
                Some(Err(ScrubError::TruncatedOption))
            }
        }
    }
}

/// Decode an option list lazily
pub fn decode_options(i: &[u8]) -> OptionsIter {
    OptionsIter { rem: i, done: false }
}

/// Decode an option list eagerly
pub(crate) fn parse_options(i: &[u8]) -> Result<Vec<PcapNgOption>, ScrubError<&[u8]>> {
    decode_options(i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn parse_option_keeps_padding() {
        let input = hex!("03 00 05 00 6c 69 6e 75 78 00 00 00");
        let (rem, option) = parse_option(&input).expect("option parsing failed");
        assert!(rem.is_empty());
        assert_eq!(option.code, OptionCode::ShbOs);
        assert_eq!(option.len, 5);
        assert_eq!(option.value(), &hex!("6c 69 6e 75 78 00 00 00"));
        assert_eq!(option.as_bytes(), Some(&b"linux"[..]));
        assert_eq!(option.size(), input.len());
    }

    #[test]
    fn terminator_ends_iteration_and_is_not_yielded() {
        let input = hex!(
            "03 00 05 00 6c 69 6e 75 78 00 00 00"
            "00 00 00 00"
            "04 00 02 00 aa bb 00 00" // unreachable, after the terminator
        );
        let options: Vec<_> = decode_options(&input)
            .collect::<Result<_, _>>()
            .expect("options decoding failed");
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].code, OptionCode::ShbOs);
    }

    #[test]
    fn exhausted_buffer_ends_iteration() {
        let input = hex!("01 00 02 00 68 69 00 00 04 00 01 00 78 00 00 00");
        let options = parse_options(&input).expect("options decoding failed");
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].code, OptionCode::Comment);
        assert_eq!(options[1].code, OptionCode::ShbUserAppl);
    }

    #[test]
    fn overlong_declared_length_is_truncated_option() {
        let input = hex!("01 00 20 00 68 69 00 00");
        let mut iter = decode_options(&input);
        assert_eq!(iter.next(), Some(Err(ScrubError::TruncatedOption)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn padding_law() {
        for (len, padded) in [(0usize, 0usize), (1, 4), (2, 4), (3, 4), (4, 4), (5, 8), (8, 8)] {
            assert_eq!(align32!(len), padded);
            assert_eq!((4 - len % 4) % 4, padded - len);
        }
    }
}
