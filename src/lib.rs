#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Compressed logical streams for multiplexed transports.
//!
//! This crate ties the workspace together:
//!
//! - [`compress`] provides the streaming LZ4 and Zstandard frame codecs.
//! - [`strm`] wraps each logical stream of a multiplexing session with a
//!   codec, and ships an in-process session pair.
//! - [`conf`] loads endpoint configuration, detects the default interface and
//!   installs the `tracing` subscriber.
//!
//! The most common types are re-exported at the crate root.
//!
//! ```
//! use std::io::{Read, Write};
//! use tnet::{CompressedSession, Config, MemorySession};
//!
//! let settings = Config::default().stream_settings().unwrap();
//! let (client, server) = MemorySession::pair();
//! let client = CompressedSession::new(client, settings);
//! let server = CompressedSession::new(server, settings);
//!
//! let mut stream = client.open_stream().unwrap();
//! stream.write_all(b"ping").unwrap();
//! stream.close().unwrap();
//!
//! let mut received = String::new();
//! server.accept_stream().unwrap().read_to_string(&mut received).unwrap();
//! assert_eq!(received, "ping");
//! ```

pub use compress;
pub use conf;
pub use strm;

pub use conf::{Config, ConfigError, init_tracing};
pub use strm::{
    CompressedSession, CompressedStream, LogicalStream, MemorySession, MemoryStream, SessionError,
    StreamId, StreamSession, StreamSettings, WritePolicy,
};
