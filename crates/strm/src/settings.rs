//! Parameters shared by every compressed stream of a session.

use core::fmt;
use core::str::FromStr;

use compress::{CompressionAlgorithm, CompressionLevel};
use thiserror::Error;

/// When the compressed stream pushes encoded bytes to the underlying stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum WritePolicy {
    /// Flush after every `write`, so the peer can read each write as soon as
    /// the call returns.
    #[default]
    FlushEachWrite,
    /// Keep encoded bytes in the codec until `flush` or `close`.
    Buffered,
}

impl WritePolicy {
    /// Returns the name used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FlushEachWrite => "flush-each-write",
            Self::Buffered => "buffered",
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a write policy name is not recognised.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unknown write policy: {input}")]
pub struct WritePolicyParseError {
    input: String,
}

impl WritePolicyParseError {
    /// Returns the rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl FromStr for WritePolicy {
    type Err = WritePolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flush-each-write" | "flush" => Ok(Self::FlushEachWrite),
            "buffered" => Ok(Self::Buffered),
            _ => Err(WritePolicyParseError {
                input: s.to_owned(),
            }),
        }
    }
}

/// Codec and write policy used to build compressed streams.
///
/// Both peers of a stream must agree on the algorithm. The level and write
/// policy only affect the local encoder.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StreamSettings {
    algorithm: CompressionAlgorithm,
    level: CompressionLevel,
    write_policy: WritePolicy,
}

impl StreamSettings {
    /// Returns settings with the given codec and defaults for the rest.
    #[must_use]
    pub fn new(algorithm: CompressionAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Replaces the codec.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: CompressionAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Replaces the compression level.
    #[must_use]
    pub const fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Replaces the write policy.
    #[must_use]
    pub const fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }

    /// Codec used on both directions of the stream.
    #[must_use]
    pub const fn algorithm(&self) -> CompressionAlgorithm {
        self.algorithm
    }

    /// Level used by the encoder.
    #[must_use]
    pub const fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Flushing behaviour of the encoder.
    #[must_use]
    pub const fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }
}
