#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `compress` provides the streaming codecs that sit underneath tnet's
//! compressed logical streams. Each codec turns an unbounded byte stream into
//! a sequence of self-delimiting frames and back again without holding the
//! whole payload in memory.
//!
//! # Design
//!
//! [`FrameEncoder`] and [`FrameDecoder`] dispatch to the selected
//! [`CompressionAlgorithm`]. The [`lz4`] module wraps the LZ4 frame format from
//! [`lz4_flex`](https://docs.rs/lz4_flex) and is the default; the `zstd` module
//! (behind the `zstd` feature) wraps [`zstd`](https://docs.rs/zstd).
//!
//! # Invariants
//!
//! - [`FrameEncoder::flush`](std::io::Write::flush) emits every byte accepted so
//!   far as a complete block, so a peer decoder can return it without waiting
//!   for more input.
//! - [`FrameEncoder::finish_into_inner`] writes the end-of-stream marker. A
//!   decoder that reaches end of input exactly after that marker reports a
//!   clean end of stream (`Ok(0)`).
//! - Errors raised by the wrapped reader or writer are returned unchanged.
//!   Errors raised by the codec itself are reported as
//!   [`std::io::ErrorKind::InvalidData`] wrapping [`CorruptStream`].
//!
//! # Examples
//!
//! ```
//! use std::io::{Read, Write};
//! use compress::{CompressionAlgorithm, CompressionLevel, FrameDecoder, FrameEncoder};
//!
//! # fn main() -> std::io::Result<()> {
//! let mut encoder =
//!     FrameEncoder::new(Vec::new(), CompressionAlgorithm::Lz4, CompressionLevel::Default)?;
//! encoder.write_all(b"streaming example payload")?;
//! encoder.flush()?;
//! let (wire, _compressed_len) = encoder.finish_into_inner()?;
//!
//! let mut decoder = FrameDecoder::new(&wire[..], CompressionAlgorithm::Lz4)?;
//! let mut restored = Vec::new();
//! decoder.read_to_end(&mut restored)?;
//! assert_eq!(restored, b"streaming example payload");
//! # Ok(())
//! # }
//! ```

pub mod algorithm;
mod common;
mod error;
mod frame;
pub mod level;
pub mod lz4;
#[cfg(feature = "zstd")]
pub mod zstd;

pub use algorithm::{CompressionAlgorithm, CompressionAlgorithmParseError};
pub use error::{CorruptStream, is_corruption};
pub use frame::{FrameDecoder, FrameEncoder, compress_to_vec, decompress_to_vec};
pub use level::{CompressionLevel, CompressionLevelError};
