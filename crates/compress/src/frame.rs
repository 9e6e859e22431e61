//! Algorithm-dispatching streaming encoder and decoder.

use std::io::{self, Read, Write};

use crate::algorithm::CompressionAlgorithm;
use crate::common::{CountingWriter, SourceReader};
use crate::error::CorruptStream;
use crate::level::CompressionLevel;
use crate::lz4;
#[cfg(feature = "zstd")]
use crate::zstd;

enum EncoderKind<W: Write> {
    Lz4(lz4::Encoder<CountingWriter<W>>),
    #[cfg(feature = "zstd")]
    Zstd(zstd::Encoder<CountingWriter<W>>),
}

/// Streaming encoder that turns written bytes into compressed frames.
///
/// Bytes accepted by [`Write::write`] stay buffered inside the codec until
/// [`Write::flush`] or [`FrameEncoder::finish_into_inner`] pushes them to the
/// sink. Errors returned by the sink are propagated unchanged.
pub struct FrameEncoder<W: Write> {
    inner: EncoderKind<W>,
    algorithm: CompressionAlgorithm,
}

impl<W: Write> FrameEncoder<W> {
    /// Creates an encoder writing compressed frames into `sink`.
    ///
    /// No bytes are written until the first flush.
    pub fn new(
        sink: W,
        algorithm: CompressionAlgorithm,
        level: CompressionLevel,
    ) -> io::Result<Self> {
        let sink = CountingWriter::new(sink);
        let inner = match algorithm {
            CompressionAlgorithm::Lz4 => EncoderKind::Lz4(lz4::encoder(sink, level)),
            #[cfg(feature = "zstd")]
            CompressionAlgorithm::Zstd => EncoderKind::Zstd(zstd::encoder(sink, level)?),
        };
        Ok(Self { inner, algorithm })
    }

    /// Returns the codec in use.
    #[must_use]
    pub const fn algorithm(&self) -> CompressionAlgorithm {
        self.algorithm
    }

    /// Returns the number of compressed bytes handed to the sink so far.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.counting_ref().bytes()
    }

    /// Provides immutable access to the sink.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        self.counting_ref().inner_ref()
    }

    /// Provides mutable access to the sink.
    ///
    /// Writing to the sink directly interleaves raw bytes with compressed
    /// frames and corrupts the stream for the peer.
    #[must_use]
    pub fn get_mut(&mut self) -> &mut W {
        match &mut self.inner {
            EncoderKind::Lz4(encoder) => encoder.get_mut().inner_mut(),
            #[cfg(feature = "zstd")]
            EncoderKind::Zstd(encoder) => encoder.get_mut().inner_mut(),
        }
    }

    /// Flushes buffered input, writes the end-of-stream marker, and returns the
    /// sink together with the total number of compressed bytes.
    pub fn finish_into_inner(self) -> io::Result<(W, u64)> {
        let writer = match self.inner {
            EncoderKind::Lz4(encoder) => lz4::finish(encoder)?,
            #[cfg(feature = "zstd")]
            EncoderKind::Zstd(encoder) => zstd::finish(encoder)?,
        };
        Ok(writer.into_parts())
    }

    fn counting_ref(&self) -> &CountingWriter<W> {
        match &self.inner {
            EncoderKind::Lz4(encoder) => encoder.get_ref(),
            #[cfg(feature = "zstd")]
            EncoderKind::Zstd(encoder) => encoder.get_ref(),
        }
    }
}

impl<W: Write> Write for FrameEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            EncoderKind::Lz4(encoder) => encoder.write(buf),
            #[cfg(feature = "zstd")]
            EncoderKind::Zstd(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            EncoderKind::Lz4(encoder) => encoder.flush(),
            #[cfg(feature = "zstd")]
            EncoderKind::Zstd(encoder) => encoder.flush(),
        }
    }
}

enum DecoderKind<R: Read> {
    Lz4(lz4::Decoder<SourceReader<R>>),
    #[cfg(feature = "zstd")]
    Zstd(zstd::Decoder<SourceReader<R>>),
}

/// Streaming decoder that yields the original bytes from compressed frames.
///
/// A read returns as soon as at least one byte has been decoded. End of input
/// at a frame boundary is a clean end of stream; anything the codec cannot
/// decode, including input that stops mid-frame, fails with
/// [`io::ErrorKind::InvalidData`] wrapping [`CorruptStream`]. Errors raised by
/// the source reader are returned unchanged.
pub struct FrameDecoder<R: Read> {
    inner: DecoderKind<R>,
    algorithm: CompressionAlgorithm,
    bytes: u64,
}

impl<R: Read> FrameDecoder<R> {
    /// Creates a decoder pulling compressed frames from `source`.
    ///
    /// Nothing is read until the first call to [`Read::read`].
    pub fn new(source: R, algorithm: CompressionAlgorithm) -> io::Result<Self> {
        let source = SourceReader::new(source);
        let inner = match algorithm {
            CompressionAlgorithm::Lz4 => DecoderKind::Lz4(lz4::decoder(source)),
            #[cfg(feature = "zstd")]
            CompressionAlgorithm::Zstd => DecoderKind::Zstd(zstd::decoder(source)?),
        };
        Ok(Self {
            inner,
            algorithm,
            bytes: 0,
        })
    }

    /// Returns the codec in use.
    #[must_use]
    pub const fn algorithm(&self) -> CompressionAlgorithm {
        self.algorithm
    }

    /// Returns the number of decompressed bytes delivered so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// Returns an immutable reference to the source.
    #[must_use]
    pub fn get_ref(&self) -> &R {
        match &self.inner {
            DecoderKind::Lz4(decoder) => decoder.get_ref().get_ref(),
            #[cfg(feature = "zstd")]
            DecoderKind::Zstd(decoder) => decoder.get_ref().get_ref().get_ref(),
        }
    }

    /// Returns a mutable reference to the source.
    ///
    /// Reading from the source directly skips compressed bytes and breaks
    /// subsequent decoding.
    #[must_use]
    pub fn get_mut(&mut self) -> &mut R {
        self.source_mut().get_mut()
    }

    /// Consumes the decoder and returns the source. Buffered input is lost.
    #[must_use]
    pub fn into_inner(self) -> R {
        match self.inner {
            DecoderKind::Lz4(decoder) => decoder.into_inner().into_inner(),
            #[cfg(feature = "zstd")]
            DecoderKind::Zstd(decoder) => decoder.finish().into_inner().into_inner(),
        }
    }

    fn source_mut(&mut self) -> &mut SourceReader<R> {
        match &mut self.inner {
            DecoderKind::Lz4(decoder) => decoder.get_mut(),
            #[cfg(feature = "zstd")]
            DecoderKind::Zstd(decoder) => decoder.get_mut().get_mut(),
        }
    }
}

impl<R: Read> Read for FrameDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        self.source_mut().reset();
        let result = match &mut self.inner {
            DecoderKind::Lz4(decoder) => decoder.read(buf),
            #[cfg(feature = "zstd")]
            DecoderKind::Zstd(decoder) => decoder.read(buf),
        };

        match result {
            Ok(read) => {
                self.bytes = self.bytes.saturating_add(read as u64);
                Ok(read)
            }
            Err(err) if self.source_mut().failed() => Err(err),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Err(err),
            Err(err) => Err(CorruptStream::new(self.algorithm, err).into()),
        }
    }
}

/// Compresses `input` into a complete stream held in a new [`Vec`].
pub fn compress_to_vec(
    input: &[u8],
    algorithm: CompressionAlgorithm,
    level: CompressionLevel,
) -> io::Result<Vec<u8>> {
    let mut encoder = FrameEncoder::new(Vec::new(), algorithm, level)?;
    encoder.write_all(input)?;
    let (output, _) = encoder.finish_into_inner()?;
    Ok(output)
}

/// Decompresses a complete stream into a new [`Vec`].
pub fn decompress_to_vec(input: &[u8], algorithm: CompressionAlgorithm) -> io::Result<Vec<u8>> {
    let mut decoder = FrameDecoder::new(input, algorithm)?;
    let mut output = Vec::new();
    decoder.read_to_end(&mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_corruption;

    #[test]
    fn encoder_construction_writes_nothing() {
        let mut encoder =
            FrameEncoder::new(Vec::new(), CompressionAlgorithm::Lz4, CompressionLevel::Default)
                .unwrap();
        assert!(encoder.get_ref().is_empty());
        assert_eq!(encoder.bytes_written(), 0);
        encoder.write_all(b"buffered").unwrap();
        encoder.flush().unwrap();
        assert!(!encoder.get_ref().is_empty());
        assert_eq!(encoder.bytes_written() as usize, encoder.get_ref().len());
    }

    #[test]
    fn flushed_prefix_decodes_without_end_marker() {
        let mut encoder =
            FrameEncoder::new(Vec::new(), CompressionAlgorithm::Lz4, CompressionLevel::Default)
                .unwrap();
        encoder.write_all(b"first chunk").unwrap();
        encoder.flush().unwrap();
        let prefix = encoder.get_ref().clone();

        let mut decoder = FrameDecoder::new(&prefix[..], CompressionAlgorithm::Lz4).unwrap();
        let mut buf = [0u8; 64];
        let read = decoder.read(&mut buf).unwrap();
        assert_eq!(&buf[..read], b"first chunk");
        assert_eq!(decoder.bytes_read(), 11);
    }

    #[test]
    fn decoder_counts_bytes_and_reaches_clean_eof() {
        let wire =
            compress_to_vec(b"payload", CompressionAlgorithm::Lz4, CompressionLevel::Fast).unwrap();
        let mut decoder = FrameDecoder::new(&wire[..], CompressionAlgorithm::Lz4).unwrap();
        let mut output = Vec::new();
        decoder.read_to_end(&mut output).unwrap();
        assert_eq!(output, b"payload");
        assert_eq!(decoder.bytes_read(), 7);
        assert_eq!(decoder.read(&mut [0u8; 8]).unwrap(), 0);
    }

    #[test]
    fn garbage_input_is_reported_as_corruption() {
        let err = decompress_to_vec(b"definitely not lz4", CompressionAlgorithm::Lz4).unwrap_err();
        assert!(is_corruption(&err), "unexpected error: {err:?}");
    }

    #[test]
    fn empty_read_buffer_does_not_touch_source() {
        let mut decoder = FrameDecoder::new(&b"garbage"[..], CompressionAlgorithm::Lz4).unwrap();
        assert_eq!(decoder.read(&mut []).unwrap(), 0);
        assert_eq!(decoder.get_ref().len(), 7);
    }

    #[test]
    fn into_inner_returns_source() {
        let wire =
            compress_to_vec(b"x", CompressionAlgorithm::Lz4, CompressionLevel::Default).unwrap();
        let decoder = FrameDecoder::new(wire.as_slice(), CompressionAlgorithm::Lz4).unwrap();
        assert_eq!(decoder.into_inner(), wire.as_slice());
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn zstd_flushed_prefix_decodes_without_end_marker() {
        let mut encoder =
            FrameEncoder::new(Vec::new(), CompressionAlgorithm::Zstd, CompressionLevel::Default)
                .unwrap();
        encoder.write_all(b"zstd chunk").unwrap();
        encoder.flush().unwrap();
        let prefix = encoder.get_ref().clone();

        let mut decoder = FrameDecoder::new(&prefix[..], CompressionAlgorithm::Zstd).unwrap();
        let mut buf = [0u8; 64];
        let read = decoder.read(&mut buf).unwrap();
        assert_eq!(&buf[..read], b"zstd chunk");
    }
}
