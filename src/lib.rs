//! # PCAPNG capture scrubber
//!
//! Codec and rewriting pipeline for block-structured PCAPNG capture files.
//!
//! The [`pcapng`] module frames the generic type + length + body +
//! trailing-length envelope, decodes the three supported block kinds
//! (Section Header, Interface Description, Enhanced Packet) and their nested
//! option lists, and [`serialize`](ToVec) re-encodes blocks byte-faithfully:
//! with no transform applied, decode-then-encode reproduces the input
//! stream exactly. The envelope length is always recomputed from the body,
//! so targeted mutations (option redaction, byte substitution in packet
//! bodies) yield self-consistent output without any length bookkeeping in
//! the transforms themselves.
//!
//! # Example
//!
//! ```rust
//! use pcapng_scrub::{scrub, TransformConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // a capture holding a single Section Header Block without options
//! let capture: &[u8] = &[
//!     0x0a, 0x0d, 0x0d, 0x0a, 28, 0, 0, 0, 0x4d, 0x3c, 0x2b, 0x1a, 1, 0, 0, 0,
//!     0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 28, 0, 0, 0,
//! ];
//! let mut output = Vec::new();
//! let stats = scrub(capture, &mut output, &TransformConfig::default())?;
//! assert_eq!(stats.blocks, 1);
//! assert_eq!(output, capture);
//! # Ok(())
//! # }
//! ```
//!
//! For streaming input, [`RawBlockReader`] frames blocks from any
//! [`Read`](std::io::Read) source using a circular buffer, so memory usage
//! stays constant regardless of capture size.

mod error;
pub use error::*;

mod linktype;
pub use linktype::*;

pub mod pcapng;
pub use pcapng::*;

mod serialize;
pub use serialize::*;

mod transform;
pub use transform::*;

mod pipeline;
pub use pipeline::*;
