//! LZ4 frame codec.
//!
//! Streams use the LZ4 frame format with linked blocks so that each flushed
//! block may reference data from earlier blocks in the same stream, and with a
//! content checksum so the decoder validates the whole stream at its end
//! marker. The block size bounds the per-stream buffer held by the encoder.
//!
//! The decoder tracks whether a frame is open so that input ending between
//! two blocks is reported as truncation rather than a clean end of stream.

use std::io::{self, BufReader, Read, Write};

use lz4_flex::frame::{BlockMode, BlockSize, Error as FrameError, FrameInfo};

use crate::level::CompressionLevel;

pub(crate) type Encoder<W> = lz4_flex::frame::FrameEncoder<W>;

/// LZ4 frame magic number, little endian on the wire.
pub const MAGIC: [u8; 4] = [0x04, 0x22, 0x4D, 0x18];

/// Returns the frame parameters used for `level`.
///
/// Higher levels trade memory for ratio by allowing larger blocks.
#[must_use]
pub fn frame_info_for_level(level: CompressionLevel) -> FrameInfo {
    let block_size = match level.numeric() {
        0..=6 => BlockSize::Max64KB,
        7..=8 => BlockSize::Max256KB,
        _ => BlockSize::Max1MB,
    };

    FrameInfo::new()
        .block_mode(BlockMode::Linked)
        .block_size(block_size)
        .content_checksum(true)
}

pub(crate) fn encoder<W: Write>(sink: W, level: CompressionLevel) -> Encoder<W> {
    lz4_flex::frame::FrameEncoder::with_frame_info(frame_info_for_level(level), sink)
}

pub(crate) fn decoder<R: Read>(source: R) -> Decoder<R> {
    Decoder {
        inner: lz4_flex::frame::FrameDecoder::new(StepReader::new(BufReader::new(source))),
        frame_open: false,
    }
}

pub(crate) fn finish<W: Write>(encoder: Encoder<W>) -> io::Result<W> {
    encoder.finish().map_err(frame_error)
}

/// LZ4 frame decoder that refuses to treat a cut-off frame as end of stream.
pub(crate) struct Decoder<R: Read> {
    inner: lz4_flex::frame::FrameDecoder<StepReader<BufReader<R>>>,
    frame_open: bool,
}

impl<R: Read> Decoder<R> {
    pub(crate) fn get_ref(&self) -> &R {
        self.inner.get_ref().inner.get_ref()
    }

    pub(crate) fn get_mut(&mut self) -> &mut R {
        self.inner.get_mut().inner.get_mut()
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner.into_inner().inner.into_inner()
    }
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.get_mut().begin_step();
        let read = self.inner.read(buf)?;
        if read > 0 {
            self.frame_open = true;
            return Ok(read);
        }

        // Ok(0) without hitting EOF means the end marker was consumed.
        let step = self.inner.get_ref();
        if step.hit_eof && (self.frame_open || step.consumed > 0) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input ended inside an LZ4 frame",
            ));
        }
        self.frame_open = false;
        Ok(0)
    }
}

/// Records what a single decode step pulled from the buffered source.
struct StepReader<R> {
    inner: R,
    consumed: u64,
    hit_eof: bool,
}

impl<R> StepReader<R> {
    const fn new(inner: R) -> Self {
        Self {
            inner,
            consumed: 0,
            hit_eof: false,
        }
    }

    fn begin_step(&mut self) {
        self.consumed = 0;
        self.hit_eof = false;
    }
}

impl<R: Read> Read for StepReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if read == 0 && !buf.is_empty() {
            self.hit_eof = true;
        }
        self.consumed = self.consumed.saturating_add(read as u64);
        Ok(read)
    }
}

/// Unwraps I/O errors from the sink; everything else is a codec failure.
fn frame_error(err: FrameError) -> io::Error {
    match err {
        FrameError::IoError(err) => err,
        other => io::Error::other(other),
    }
}
