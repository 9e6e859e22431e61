#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Compressed logical streams over a stream-multiplexing session.
//!
//! # Overview
//!
//! A multiplexing session carries many ordered, bidirectional logical streams
//! over one transport connection. This crate consumes such sessions through the
//! [`StreamSession`] and [`LogicalStream`] traits and layers a streaming codec
//! on top of each stream with [`CompressedStream`]. The adapter speaks the same
//! [`std::io::Read`]/[`std::io::Write`] contract as the stream it wraps, so it
//! can stand in for an uncompressed stream anywhere.
//!
//! # Design
//!
//! - [`CompressedStream`] owns one decoder reading from the stream and one
//!   encoder writing to it. Under the default [`WritePolicy::FlushEachWrite`]
//!   every successful `write` leaves the peer able to read the bytes.
//! - [`CompressedSession`] wraps a session so every opened or accepted stream
//!   comes back already wrapped with shared [`StreamSettings`].
//! - [`MemorySession`] is an in-process session pair with bounded pipes, used
//!   for tests and local loopback.
//!
//! # Invariants
//!
//! - `close` finishes the codec frame before closing the underlying stream, so
//!   the peer reads a clean end of stream.
//! - A failed final flush never prevents the underlying close.
//! - Errors from the underlying stream keep their [`std::io::ErrorKind`];
//!   malformed input is reported as [`std::io::ErrorKind::InvalidData`].
//!
//! # Examples
//!
//! ```
//! use std::io::{Read, Write};
//! use strm::{CompressedSession, MemorySession, StreamSettings};
//!
//! let (client, server) = MemorySession::pair();
//! let client = CompressedSession::new(client, StreamSettings::default());
//! let server = CompressedSession::new(server, StreamSettings::default());
//!
//! let mut outbound = client.open_stream().unwrap();
//! outbound.write_all(b"hello").unwrap();
//!
//! let mut inbound = server.accept_stream().unwrap();
//! let mut received = [0u8; 5];
//! inbound.read_exact(&mut received).unwrap();
//! assert_eq!(&received, b"hello");
//! assert_eq!(inbound.id(), outbound.id());
//!
//! outbound.close().unwrap();
//! ```

mod compressed;
mod error;
pub mod memory;
mod session;
mod settings;
mod stream;

pub use compressed::{CompressedReadHalf, CompressedStream, CompressedWriteHalf};
pub use error::SessionError;
pub use memory::{MemorySession, MemoryStream};
pub use session::CompressedSession;
pub use settings::{StreamSettings, WritePolicy, WritePolicyParseError};
pub use stream::{LogicalStream, StreamId, StreamSession};

pub use compress::{CompressionAlgorithm, CompressionLevel, is_corruption};

pub(crate) const LOG_TARGET: &str = "tnet::strm";
