//! Zstandard frame codec.
//!
//! `flush` ends the current zstd block so that everything accepted so far is
//! decodable by the peer; `finish` closes the frame.

use std::io::{self, BufReader, Read, Write};

use crate::level::CompressionLevel;

pub(crate) type Encoder<W> = zstd::stream::write::Encoder<'static, W>;
pub(crate) type Decoder<R> = zstd::stream::read::Decoder<'static, BufReader<R>>;

/// Zstandard frame magic number, little endian on the wire.
pub const MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Maps a workspace level onto the zstd level scale.
#[must_use]
pub fn zstd_level(level: CompressionLevel) -> i32 {
    match level {
        CompressionLevel::Fast => 1,
        CompressionLevel::Default => 3,
        CompressionLevel::Best => 19,
        CompressionLevel::Precise(value) => i32::from(value.get()),
    }
}

pub(crate) fn encoder<W: Write>(sink: W, level: CompressionLevel) -> io::Result<Encoder<W>> {
    zstd::stream::write::Encoder::new(sink, zstd_level(level))
}

pub(crate) fn decoder<R: Read>(source: R) -> io::Result<Decoder<R>> {
    zstd::stream::read::Decoder::new(source)
}

pub(crate) fn finish<W: Write>(encoder: Encoder<W>) -> io::Result<W> {
    encoder.finish()
}
