//! Classification of codec failures.

use std::io;

use crate::algorithm::CompressionAlgorithm;

/// Compressed input that the codec could not decode.
///
/// Carried inside an [`io::Error`] of kind [`io::ErrorKind::InvalidData`] so
/// that callers can tell a damaged stream from a clean end of stream or a
/// failure of the underlying transport.
#[derive(Debug, thiserror::Error)]
#[error("corrupt {algorithm} stream: {source}")]
pub struct CorruptStream {
    algorithm: CompressionAlgorithm,
    #[source]
    source: io::Error,
}

impl CorruptStream {
    pub(crate) const fn new(algorithm: CompressionAlgorithm, source: io::Error) -> Self {
        Self { algorithm, source }
    }

    /// Returns the codec that rejected the input.
    #[must_use]
    pub const fn algorithm(&self) -> CompressionAlgorithm {
        self.algorithm
    }
}

impl From<CorruptStream> for io::Error {
    fn from(err: CorruptStream) -> Self {
        Self::new(io::ErrorKind::InvalidData, err)
    }
}

/// Returns `true` when `err` reports corrupt compressed input.
#[must_use]
pub fn is_corruption(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::InvalidData
        && err
            .get_ref()
            .is_some_and(|inner| inner.is::<CorruptStream>())
}
