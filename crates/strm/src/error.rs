use std::io;

use thiserror::Error;

use crate::stream::StreamId;

/// Failures raised by sessions and compressed streams.
///
/// Stream operations return [`io::Result`]; these values reach callers as the
/// payload of an [`io::Error`] whose kind is given by [`SessionError::kind`].
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum SessionError {
    /// The session was closed; no stream can be opened or accepted.
    #[error("session is closed")]
    Closed,
    /// The logical stream was closed by either side.
    #[error("stream {0} is closed")]
    StreamClosed(StreamId),
    /// The compressed stream was closed locally and accepts no more writes.
    #[error("compressed stream {0} was closed")]
    AdapterClosed(StreamId),
}

impl SessionError {
    /// Returns the [`io::ErrorKind`] used when converting into [`io::Error`].
    #[must_use]
    pub const fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Closed => io::ErrorKind::ConnectionAborted,
            Self::StreamClosed(_) => io::ErrorKind::BrokenPipe,
            Self::AdapterClosed(_) => io::ErrorKind::NotConnected,
        }
    }
}

impl From<SessionError> for io::Error {
    fn from(err: SessionError) -> Self {
        Self::new(err.kind(), err)
    }
}
