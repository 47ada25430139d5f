use std::str::FromStr;

use thiserror::Error;

use crate::pcapng::Block;

/// A malformed byte-substitution pattern
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid replace pattern: {0}")]
pub struct InvalidReplacePattern(pub String);

/// A single byte-substitution rule: replace every occurrence of `from` with
/// `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub from: Vec<u8>,
    pub to: Vec<u8>,
}

impl FromStr for Substitution {
    type Err = InvalidReplacePattern;

    /// Parse a `from/to` rule of colon-separated hex pairs, for example
    /// `aa:bb:cc/00:00:00`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once('/')
            .ok_or_else(|| InvalidReplacePattern(format!("`{s}`: expected `from/to`")))?;
        let from = parse_hex_pattern(from)?;
        let to = parse_hex_pattern(to)?;
        if from.is_empty() {
            return Err(InvalidReplacePattern(format!(
                "`{s}`: source pattern is empty"
            )));
        }
        Ok(Substitution { from, to })
    }
}

fn parse_hex_pattern(s: &str) -> Result<Vec<u8>, InvalidReplacePattern> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(':')
        .map(|pair| {
            if pair.len() != 2 {
                return Err(InvalidReplacePattern(format!(
                    "`{s}`: `{pair}` is not a two-digit hex byte"
                )));
            }
            u8::from_str_radix(pair, 16).map_err(|_| {
                InvalidReplacePattern(format!("`{s}`: `{pair}` is not a two-digit hex byte"))
            })
        })
        .collect()
}

/// Transform configuration, passed explicitly into the pipeline entry point
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    /// Drop all options from Section Header Blocks
    pub redact_options: bool,
    /// Byte-substitution rules applied to packet block bodies, in order
    pub substitutions: Vec<Substitution>,
}

impl TransformConfig {
    /// Returns true if the configuration leaves every block unchanged
    pub fn is_noop(&self) -> bool {
        !self.redact_options && self.substitutions.is_empty()
    }
}

/// Apply the configured transforms to a decoded block
pub fn apply(block: &mut Block, config: &TransformConfig) {
    if config.redact_options {
        redact(block);
    }
    if !config.substitutions.is_empty() {
        substitute(block, &config.substitutions);
    }
}

/// Drop all section-level metadata options
///
/// Only Section Header Blocks carry redactable metadata; other blocks are
/// left untouched. Idempotent.
pub fn redact(block: &mut Block) {
    if let Block::SectionHeader(shb) = block {
        shb.options.clear();
    }
}

/// Apply substitution rules to the raw body of a packet block
///
/// Rules run in the order given, each over the previous rule's output.
/// Matching is non-overlapping, left to right, and spans the whole raw body,
/// fixed header fields included.
pub fn substitute(block: &mut Block, rules: &[Substitution]) {
    if let Block::EnhancedPacket(epb) = block {
        for rule in rules {
            let replaced = replace_all(epb.raw_body(), &rule.from, &rule.to);
            if let Some(data) = replaced {
                epb.set_raw_body(data);
            }
        }
    }
}

// Returns None if the pattern does not occur.
fn replace_all(haystack: &[u8], from: &[u8], to: &[u8]) -> Option<Vec<u8>> {
    if from.is_empty() || from.len() > haystack.len() {
        return None;
    }
    let mut out: Option<Vec<u8>> = None;
    let mut last = 0;
    let mut i = 0;
    while i + from.len() <= haystack.len() {
        if &haystack[i..i + from.len()] == from {
            let out = out.get_or_insert_with(Vec::new);
            out.extend_from_slice(&haystack[last..i]);
            out.extend_from_slice(to);
            i += from.len();
            last = i;
        } else {
            i += 1;
        }
    }
    let mut out = out?;
    out.extend_from_slice(&haystack[last..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcapng::{decode_block, parse_raw_block_le};
    use crate::serialize::ToVec;
    use hex_literal::hex;

    #[test]
    fn parse_substitution_rule() {
        let rule: Substitution = "aa:bb:cc/00:11:22".parse().expect("parsing failed");
        assert_eq!(rule.from, hex!("aa bb cc"));
        assert_eq!(rule.to, hex!("00 11 22"));
    }

    #[test]
    fn substitution_patterns_may_differ_in_length() {
        let rule: Substitution = "aa:bb/cc".parse().expect("parsing failed");
        assert_eq!(rule.from, hex!("aa bb"));
        assert_eq!(rule.to, hex!("cc"));
        // an empty replacement deletes the pattern
        let rule: Substitution = "aa:bb/".parse().expect("parsing failed");
        assert!(rule.to.is_empty());
    }

    #[test]
    fn reject_malformed_rules() {
        for s in ["aa:bb", "zz/00", "a:bb/00", "aaa/00", "/00", "aa::bb/00"] {
            assert!(s.parse::<Substitution>().is_err(), "accepted `{s}`");
        }
    }

    #[test]
    fn replace_all_is_non_overlapping_left_to_right() {
        assert_eq!(
            replace_all(b"aaaa", b"aa", b"b"),
            Some(b"bb".to_vec())
        );
        assert_eq!(
            replace_all(&hex!("01 02 03 02 03 04"), &hex!("02 03"), &hex!("ff ff")),
            Some(hex!("01 ff ff ff ff 04").to_vec())
        );
        assert_eq!(replace_all(b"abc", b"xy", b"z"), None);
        assert_eq!(replace_all(b"a", b"long", b"z"), None);
    }

    #[test]
    fn redaction_is_idempotent() {
        let frame = crate::pcapng::tests::FRAME_SHB;
        let (_, raw) = parse_raw_block_le(frame).expect("framing failed");
        let mut block = decode_block(&raw).expect("decoding failed");

        redact(&mut block);
        let once = block.to_vec().expect("serialization failed");
        redact(&mut block);
        let twice = block.to_vec().expect("serialization failed");

        assert_eq!(once, twice);
        assert_eq!(once.len(), 28); // all option bytes removed
    }

    #[test]
    fn substitution_rules_chain_in_order() {
        // payload holds aa bb; first rule rewrites it, second rule rewrites
        // the first rule's output
        let frame = hex!(
            "
            06 00 00 00 24 00 00 00 00 00 00 00 00 00 00 00
            01 00 00 00 02 00 00 00 02 00 00 00 aa bb 00 00
            24 00 00 00"
        );
        let (_, raw) = parse_raw_block_le(&frame).expect("framing failed");
        let mut block = decode_block(&raw).expect("decoding failed");
        let rules = vec![
            "aa:bb/cc:dd".parse().unwrap(),
            "cc:dd/ee:ff".parse().unwrap(),
        ];
        substitute(&mut block, &rules);
        let v = block.to_vec().expect("serialization failed");
        assert_eq!(v[28..30], hex!("ee ff"));
        assert_eq!(v.len(), frame.len());
    }
}
