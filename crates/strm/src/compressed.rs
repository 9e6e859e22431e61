//! Transparent compression over one logical stream.

use std::io::{self, Read, Write};

use compress::{CompressionAlgorithm, FrameDecoder, FrameEncoder};
use tracing::{debug, trace, warn};

use crate::LOG_TARGET;
use crate::error::SessionError;
use crate::settings::{StreamSettings, WritePolicy};
use crate::stream::{LogicalStream, StreamId};

/// A logical stream whose payload is compressed on the wire.
///
/// Reads pull compressed frames from the underlying stream and return the
/// decompressed bytes; writes compress and, under
/// [`WritePolicy::FlushEachWrite`], push the frame to the stream before
/// returning. The adapter is bound to one stream for its whole life.
///
/// The decoder and encoder are independent. Use [`CompressedStream::split`]
/// to drive reads and writes from different threads.
///
/// # Closing
///
/// [`CompressedStream::close`] finishes the codec frame and then closes the
/// underlying stream. Dropping an unclosed adapter does the same on a best
/// effort basis.
///
/// # Delegation
///
/// Operations the adapter does not cover, such as read timeouts, are reached
/// through [`CompressedStream::get_ref`]. Reading or writing through that
/// handle bypasses the codec and will desynchronise the frame stream.
pub struct CompressedStream<S: LogicalStream> {
    reader: CompressedReadHalf<S>,
    writer: CompressedWriteHalf<S>,
}

impl<S: LogicalStream> CompressedStream<S> {
    /// Wraps `stream` with the default settings.
    pub fn new(stream: S) -> io::Result<Self> {
        Self::with_settings(stream, StreamSettings::default())
    }

    /// Wraps `stream` using the codec and write policy from `settings`.
    ///
    /// Two extra handles are taken with [`LogicalStream::try_clone`]. Nothing
    /// is read from or written to the stream here.
    pub fn with_settings(stream: S, settings: StreamSettings) -> io::Result<Self> {
        let id = stream.id();
        let decoder = FrameDecoder::new(stream.try_clone()?, settings.algorithm())?;
        let control = stream.try_clone()?;
        let encoder = FrameEncoder::new(stream, settings.algorithm(), settings.level())?;

        debug!(
            target: LOG_TARGET,
            stream = %id,
            algorithm = %settings.algorithm(),
            policy = %settings.write_policy(),
            "wrapped logical stream"
        );

        Ok(Self {
            reader: CompressedReadHalf { id, decoder },
            writer: CompressedWriteHalf {
                id,
                encoder: Some(encoder),
                deferred: None,
                finished_bytes: 0,
                control,
                policy: settings.write_policy(),
            },
        })
    }

    /// Returns the identifier of the wrapped stream.
    #[must_use]
    pub const fn id(&self) -> StreamId {
        self.reader.id
    }

    /// Returns the codec used in both directions.
    #[must_use]
    pub const fn algorithm(&self) -> CompressionAlgorithm {
        self.reader.decoder.algorithm()
    }

    /// Returns the write policy of the encoder.
    #[must_use]
    pub const fn write_policy(&self) -> WritePolicy {
        self.writer.policy
    }

    /// Returns the underlying stream handle.
    ///
    /// Only use this for operations the adapter does not provide. Bytes read
    /// or written through it skip the codec.
    #[must_use]
    pub fn get_ref(&self) -> &S {
        self.reader.decoder.get_ref()
    }

    /// Returns the number of decompressed bytes delivered to readers.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.reader.bytes_read()
    }

    /// Returns the number of compressed bytes written to the stream.
    #[must_use]
    pub fn compressed_bytes_written(&self) -> u64 {
        self.writer.compressed_bytes_written()
    }

    /// Reports whether [`CompressedStream::close`] already ran.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.writer.is_closed()
    }

    /// Finishes the outbound frame and closes the underlying stream.
    ///
    /// See [`CompressedWriteHalf::close`].
    pub fn close(&mut self) -> io::Result<()> {
        self.writer.close()
    }

    /// Separates the read and write sides so they can move to different
    /// threads.
    #[must_use]
    pub fn split(self) -> (CompressedReadHalf<S>, CompressedWriteHalf<S>) {
        (self.reader, self.writer)
    }
}

impl<S: LogicalStream> Read for CompressedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<S: LogicalStream> Write for CompressedStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Decompressing side of a [`CompressedStream`].
pub struct CompressedReadHalf<S: LogicalStream> {
    id: StreamId,
    decoder: FrameDecoder<S>,
}

impl<S: LogicalStream> CompressedReadHalf<S> {
    /// Returns the identifier of the wrapped stream.
    #[must_use]
    pub const fn id(&self) -> StreamId {
        self.id
    }

    /// Returns the read handle of the underlying stream.
    #[must_use]
    pub fn get_ref(&self) -> &S {
        self.decoder.get_ref()
    }

    /// Returns the number of decompressed bytes delivered so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.decoder.bytes_read()
    }
}

impl<S: LogicalStream> Read for CompressedReadHalf<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decoder.read(buf)
    }
}

/// Compressing side of a [`CompressedStream`]; owns closing.
pub struct CompressedWriteHalf<S: LogicalStream> {
    id: StreamId,
    encoder: Option<FrameEncoder<S>>,
    deferred: Option<io::Error>,
    finished_bytes: u64,
    control: S,
    policy: WritePolicy,
}

impl<S: LogicalStream> CompressedWriteHalf<S> {
    /// Returns the identifier of the wrapped stream.
    #[must_use]
    pub const fn id(&self) -> StreamId {
        self.id
    }

    /// Returns the number of compressed bytes written to the stream.
    #[must_use]
    pub fn compressed_bytes_written(&self) -> u64 {
        self.encoder
            .as_ref()
            .map_or(self.finished_bytes, FrameEncoder::bytes_written)
    }

    /// Reports whether the write side was closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.encoder.is_none()
    }

    /// Finishes the outbound frame and closes the underlying stream.
    ///
    /// Pending bytes and the codec end marker are flushed first. A failure
    /// there, or a write failure still waiting to be reported, is logged and
    /// the underlying close still runs; its result is returned. Calling
    /// `close` again returns `Ok(())`.
    pub fn close(&mut self) -> io::Result<()> {
        let Some(encoder) = self.encoder.take() else {
            trace!(target: LOG_TARGET, stream = %self.id, "stream already closed");
            return Ok(());
        };
        if let Some(err) = self.deferred.take() {
            warn!(
                target: LOG_TARGET,
                stream = %self.id,
                error = %err,
                "unreported write failure at close"
            );
        }

        match encoder.finish_into_inner() {
            Ok((_, compressed)) => {
                self.finished_bytes = compressed;
                debug!(target: LOG_TARGET, stream = %self.id, compressed, "finished outbound frame");
            }
            Err(err) => {
                warn!(
                    target: LOG_TARGET,
                    stream = %self.id,
                    error = %err,
                    "final flush failed, closing stream anyway"
                );
            }
        }

        self.control.close()
    }

    fn encoder_mut(&mut self) -> io::Result<&mut FrameEncoder<S>> {
        let id = self.id;
        self.encoder
            .as_mut()
            .ok_or_else(|| SessionError::AdapterClosed(id).into())
    }

    fn take_deferred(&mut self) -> io::Result<()> {
        self.deferred.take().map_or(Ok(()), Err)
    }

    /// Keeps `err` for the next call once the codec already holds input.
    fn defer(&mut self, err: io::Error, accepted: usize) -> io::Result<usize> {
        if accepted == 0 {
            return Err(err);
        }
        debug!(
            target: LOG_TARGET,
            stream = %self.id,
            accepted,
            error = %err,
            "write failed after input was accepted, reporting on next call"
        );
        self.deferred = Some(err);
        Ok(accepted)
    }
}

impl<S: LogicalStream> Write for CompressedWriteHalf<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let policy = self.policy;
        if self.encoder.is_none() {
            return Err(SessionError::AdapterClosed(self.id).into());
        }
        self.take_deferred()?;
        if buf.is_empty() {
            return Ok(0);
        }

        let encoder = self.encoder_mut()?;
        let mut accepted = 0;
        let mut failure = None;
        while accepted < buf.len() {
            match encoder.write(&buf[accepted..]) {
                Ok(0) => {
                    failure = Some(io::Error::from(io::ErrorKind::WriteZero));
                    break;
                }
                Ok(written) => accepted += written,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        if failure.is_none() && policy == WritePolicy::FlushEachWrite {
            failure = encoder.flush().err();
        }

        match failure {
            Some(err) => self.defer(err, accepted),
            None => Ok(accepted),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.take_deferred()?;
        match self.encoder.as_mut() {
            Some(encoder) => encoder.flush(),
            None => Ok(()),
        }
    }
}

impl<S: LogicalStream> Drop for CompressedWriteHalf<S> {
    fn drop(&mut self) {
        if self.encoder.is_none() {
            return;
        }
        if let Err(err) = self.close() {
            warn!(target: LOG_TARGET, stream = %self.id, error = %err, "close on drop failed");
        }
    }
}
