use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

/// The error type for framing, decoding and streaming operations
///
/// The generic parameter is the parser input type, so decode errors can
/// borrow the data they failed on. Use [`ScrubError::to_static`] to detach an
/// error from the read buffer before propagating it out of a reader loop.
#[derive(Debug, PartialEq, Error)]
pub enum ScrubError<I: std::fmt::Debug> {
    /// No more blocks are available, the stream ended at a block boundary
    #[error("end of stream")]
    Eof,
    /// Error while reading from the underlying stream
    #[error("read error on underlying stream")]
    ReadError,
    /// Buffer does not hold a complete block yet, refill and retry
    #[error("incomplete data, missing at least {0} bytes")]
    Incomplete(usize),
    /// The reader buffer cannot hold a complete block
    #[error("buffer capacity too small to hold a complete block")]
    BufferTooSmall,
    /// The stream ended in the middle of a block
    #[error("stream truncated inside a block")]
    TruncatedStream,
    /// Envelope length fields are inconsistent or too small
    #[error("malformed block envelope")]
    MalformedEnvelope,
    /// The section header byte-order magic is not the expected constant
    #[error("section header magic not recognized")]
    InvalidMagic,
    /// The block type code has no registered decoder
    #[error("unsupported block type {0:#010x}")]
    UnsupportedBlockType(u32),
    /// A declared option length overruns the enclosing buffer
    #[error("option length overruns enclosing block")]
    TruncatedOption,
    /// Generic parser error
    #[error("parse error: {1:?}")]
    NomError(I, ErrorKind),
}

impl<'a> ScrubError<&'a [u8]> {
    /// Drop the borrowed input so the error can outlive the read buffer
    pub fn to_static(&self) -> ScrubError<&'static [u8]> {
        match self {
            ScrubError::Eof => ScrubError::Eof,
            ScrubError::ReadError => ScrubError::ReadError,
            ScrubError::Incomplete(n) => ScrubError::Incomplete(*n),
            ScrubError::BufferTooSmall => ScrubError::BufferTooSmall,
            ScrubError::TruncatedStream => ScrubError::TruncatedStream,
            ScrubError::MalformedEnvelope => ScrubError::MalformedEnvelope,
            ScrubError::InvalidMagic => ScrubError::InvalidMagic,
            ScrubError::UnsupportedBlockType(t) => ScrubError::UnsupportedBlockType(*t),
            ScrubError::TruncatedOption => ScrubError::TruncatedOption,
            ScrubError::NomError(_, k) => ScrubError::NomError(&[], *k),
        }
    }
}

impl<I: std::fmt::Debug> ParseError<I> for ScrubError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        ScrubError::NomError(input, kind)
    }
    fn append(input: I, kind: ErrorKind, _other: Self) -> Self {
        ScrubError::NomError(input, kind)
    }
}
