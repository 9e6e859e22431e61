use std::io;

use tracing::trace;

use crate::LOG_TARGET;
use crate::compressed::CompressedStream;
use crate::settings::StreamSettings;
use crate::stream::{LogicalStream, StreamSession};

/// Session wrapper whose streams come back already compressed.
///
/// Every stream is built with the same [`StreamSettings`], so two peers
/// configured alike agree on the codec.
pub struct CompressedSession<T> {
    inner: T,
    settings: StreamSettings,
}

impl<T: StreamSession> CompressedSession<T> {
    /// Wraps `inner`.
    pub const fn new(inner: T, settings: StreamSettings) -> Self {
        Self { inner, settings }
    }

    /// Settings applied to every stream.
    #[must_use]
    pub const fn settings(&self) -> StreamSettings {
        self.settings
    }

    /// Returns the wrapped session.
    #[must_use]
    pub const fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Unwraps the session.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Opens a stream on the wrapped session and wraps it.
    pub fn open_stream(&self) -> io::Result<CompressedStream<T::Stream>> {
        let stream = self.inner.open_stream()?;
        trace!(target: LOG_TARGET, stream = %stream.id(), "wrapping opened stream");
        CompressedStream::with_settings(stream, self.settings)
    }

    /// Accepts a stream from the wrapped session and wraps it.
    pub fn accept_stream(&self) -> io::Result<CompressedStream<T::Stream>> {
        let stream = self.inner.accept_stream()?;
        trace!(target: LOG_TARGET, stream = %stream.id(), "wrapping accepted stream");
        CompressedStream::with_settings(stream, self.settings)
    }
}
