//! Contract consumed from the stream-multiplexing layer.

use std::fmt;
use std::io::{self, Read, Write};

/// Identifier of a logical stream, unique within its session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StreamId(u32);

impl StreamId {
    /// Wraps a raw stream identifier.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for StreamId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One ordered, reliable, bidirectional byte channel of a session.
///
/// Handles obtained from [`LogicalStream::try_clone`] refer to the same
/// stream: bytes written through any handle share one outbound order, and a
/// close through any handle closes the stream for all of them.
pub trait LogicalStream: Read + Write + Send + Sized {
    /// Returns the stream identifier assigned by the session.
    fn id(&self) -> StreamId;

    /// Returns another handle to the same stream.
    fn try_clone(&self) -> io::Result<Self>;

    /// Closes the stream in both directions.
    ///
    /// Closing a stream that is already closed, locally or by the peer, must
    /// not fail.
    fn close(&self) -> io::Result<()>;
}

/// A session able to open and accept logical streams.
pub trait StreamSession {
    /// Stream type produced by this session.
    type Stream: LogicalStream;

    /// Opens a new outbound stream.
    fn open_stream(&self) -> io::Result<Self::Stream>;

    /// Blocks until the peer opens a stream and returns it.
    fn accept_stream(&self) -> io::Result<Self::Stream>;
}
