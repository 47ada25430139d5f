use std::io::Read;

use circular::Buffer;
use nom::{Needed, Offset};

use crate::pcapng::{parse_raw_block_le, RawBlock};
use crate::ScrubError;

/// Streaming framer over any `Read` source
///
/// Built on a circular buffer, so memory usage is constant and bounded by
/// the buffer capacity, which must be large enough for one complete block.
///
/// `next` borrows the framed block from the buffer and returns the number of
/// bytes it spans; call [`consume`](RawBlockReader::consume) with that offset
/// once the block has been fully processed, and
/// [`refill`](RawBlockReader::refill) when `next` reports `Incomplete`.
///
/// The end of the stream is reported as [`ScrubError::Eof`] when it falls at
/// a block boundary (including a trailing partial 8-byte header), and as
/// [`ScrubError::TruncatedStream`] when it falls inside a block.
pub struct RawBlockReader<R>
where
    R: Read,
{
    reader: R,
    buffer: Buffer,
    consumed: usize,
    reader_exhausted: bool,
}

impl<R> RawBlockReader<R>
where
    R: Read,
{
    /// Create a reader with the provided buffer capacity
    pub fn new(capacity: usize, mut reader: R) -> Result<RawBlockReader<R>, ScrubError<&'static [u8]>> {
        let mut buffer = Buffer::with_capacity(capacity);
        let sz = reader.read(buffer.space()).or(Err(ScrubError::ReadError))?;
        buffer.fill(sz);
        Ok(RawBlockReader {
            reader,
            buffer,
            consumed: 0,
            reader_exhausted: sz == 0,
        })
    }

    /// Frame the next block
    pub fn next(&mut self) -> Result<(usize, RawBlock), ScrubError<&[u8]>> {
        if self.buffer.available_data() == 0 && self.reader_exhausted {
            return Err(ScrubError::Eof);
        }
        let data = self.buffer.data();
        match parse_raw_block_le(data) {
            Ok((rem, block)) => {
                let offset = data.offset(rem);
                Ok((offset, block))
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e),
            Err(nom::Err::Incomplete(n)) => {
                if self.reader_exhausted {
                    // a partial header is a clean end, a partial body is not
                    if self.buffer.available_data() < 8 {
                        Err(ScrubError::Eof)
                    } else {
                        Err(ScrubError::TruncatedStream)
                    }
                } else {
                    match n {
                        Needed::Size(n) => {
                            if self.buffer.available_data() + usize::from(n)
                                >= self.buffer.capacity()
                            {
                                Err(ScrubError::BufferTooSmall)
                            } else {
                                Err(ScrubError::Incomplete(usize::from(n)))
                            }
                        }
                        Needed::Unknown => Err(ScrubError::Incomplete(0)),
                    }
                }
            }
        }
    }

    /// Discard `offset` bytes of framed data
    pub fn consume(&mut self, offset: usize) {
        self.consumed += offset;
        self.buffer.consume(offset);
    }

    /// Total number of bytes consumed so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Position of the framing cursor in the buffer
    pub fn position(&self) -> usize {
        self.buffer.position()
    }

    /// Refill the buffer from the underlying reader
    pub fn refill(&mut self) -> Result<(), ScrubError<&[u8]>> {
        self.buffer.shift();
        let space = self.buffer.space();
        // an empty space would make read() return 0 without meaning EOF
        if space.is_empty() {
            return Ok(());
        }
        let sz = self.reader.read(space).or(Err(ScrubError::ReadError))?;
        self.reader_exhausted = sz == 0;
        self.buffer.fill(sz);
        Ok(())
    }

    /// Grow the buffer capacity
    pub fn grow(&mut self, new_size: usize) -> bool {
        self.buffer.grow(new_size)
    }

    /// Current buffer capacity
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const TWO_BLOCKS: &[u8] = &hex!(
        "
        0a 0d 0d 0a 1c 00 00 00 4d 3c 2b 1a 01 00 00 00
        ff ff ff ff ff ff ff ff 1c 00 00 00
        01 00 00 00 14 00 00 00 01 00 00 00 ff ff 00 00
        14 00 00 00"
    );

    fn read_all(input: &[u8]) -> Result<Vec<(u32, usize)>, ScrubError<&'static [u8]>> {
        let mut reader = RawBlockReader::new(4096, input).expect("reader creation failed");
        let mut frames = Vec::new();
        loop {
            match reader.next() {
                Ok((offset, raw)) => {
                    frames.push((raw.block_type, raw.size()));
                    reader.consume(offset);
                }
                Err(ScrubError::Eof) => return Ok(frames),
                Err(ScrubError::Incomplete(_)) => {
                    reader.refill().map_err(|e| e.to_static())?;
                }
                Err(e) => return Err(e.to_static()),
            }
        }
    }

    #[test]
    fn frame_all_blocks_then_eof() {
        let frames = read_all(TWO_BLOCKS).expect("reading failed");
        assert_eq!(frames, vec![(0x0A0D_0D0A, 28), (1, 20)]);
    }

    #[test]
    fn empty_stream_is_eof() {
        let frames = read_all(&[]).expect("reading failed");
        assert!(frames.is_empty());
    }

    #[test]
    fn trailing_partial_header_is_eof() {
        let mut input = TWO_BLOCKS.to_vec();
        input.extend_from_slice(&hex!("0a 0d 0d 0a 1c 00 00")); // 7 bytes
        let frames = read_all(&input).expect("reading failed");
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn consumed_and_position_track_framed_bytes() {
        let mut reader = RawBlockReader::new(4096, TWO_BLOCKS).expect("reader creation failed");
        assert_eq!(reader.consumed(), 0);
        assert_eq!(reader.position(), 0);

        let (offset, raw) = reader.next().expect("framing failed");
        assert_eq!(raw.block_type, 0x0A0D_0D0A);
        reader.consume(offset);
        assert_eq!(reader.consumed(), 28);
        assert_eq!(reader.position(), 28);

        let (offset, raw) = reader.next().expect("framing failed");
        assert_eq!(raw.block_type, 1);
        reader.consume(offset);
        assert_eq!(reader.consumed(), 48);
        assert_eq!(reader.position(), 48);
    }

    #[test]
    fn stream_cut_inside_block_is_truncated() {
        let input = &TWO_BLOCKS[..TWO_BLOCKS.len() - 6];
        assert_eq!(read_all(input), Err(ScrubError::TruncatedStream));
    }
}
