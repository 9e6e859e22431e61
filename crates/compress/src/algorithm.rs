//! Enumeration of the frame codecs a compressed stream can negotiate.

use core::fmt;
use core::str::FromStr;

/// Streaming codecs recognised by the workspace.
///
/// Both peers of a logical stream must use the same algorithm; the frames are
/// not self-describing across codecs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CompressionAlgorithm {
    /// LZ4 frame format with linked blocks.
    Lz4,
    /// Zstandard frames.
    #[cfg(feature = "zstd")]
    Zstd,
}

impl CompressionAlgorithm {
    /// Returns the canonical name used in configuration files and diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lz4 => "lz4",
            #[cfg(feature = "zstd")]
            Self::Zstd => "zstd",
        }
    }

    /// Returns the algorithm used when callers do not pick one.
    #[must_use]
    pub const fn default_algorithm() -> Self {
        Self::Lz4
    }

    /// Returns the set of algorithms available in the current build.
    #[must_use]
    pub fn available() -> &'static [Self] {
        #[cfg(feature = "zstd")]
        {
            const ALGORITHMS: &[CompressionAlgorithm] =
                &[CompressionAlgorithm::Lz4, CompressionAlgorithm::Zstd];
            ALGORITHMS
        }

        #[cfg(not(feature = "zstd"))]
        {
            const ALGORITHMS: &[CompressionAlgorithm] = &[CompressionAlgorithm::Lz4];
            ALGORITHMS
        }
    }
}

impl Default for CompressionAlgorithm {
    fn default() -> Self {
        Self::default_algorithm()
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unsupported algorithm name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unsupported compression algorithm: {input}")]
pub struct CompressionAlgorithmParseError {
    input: String,
}

impl CompressionAlgorithmParseError {
    /// Creates a parse error capturing the original input.
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = CompressionAlgorithmParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lz4" => Ok(Self::Lz4),
            #[cfg(feature = "zstd")]
            "zstd" => Ok(Self::Zstd),
            other => Err(CompressionAlgorithmParseError::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lz4() {
        assert_eq!(CompressionAlgorithm::default(), CompressionAlgorithm::Lz4);
    }

    #[test]
    fn available_algorithms_always_include_lz4() {
        assert!(CompressionAlgorithm::available().contains(&CompressionAlgorithm::Lz4));
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn available_algorithms_include_zstd_when_feature_enabled() {
        assert!(CompressionAlgorithm::available().contains(&CompressionAlgorithm::Zstd));
    }

    #[test]
    fn parsing_is_case_insensitive_and_trims() {
        assert_eq!(
            " LZ4 ".parse::<CompressionAlgorithm>().unwrap(),
            CompressionAlgorithm::Lz4
        );
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn parsing_accepts_zstd() {
        assert_eq!(
            "zstd".parse::<CompressionAlgorithm>().unwrap(),
            CompressionAlgorithm::Zstd
        );
    }

    #[test]
    fn parsing_rejects_unknown_algorithms() {
        let err = "snappy"
            .parse::<CompressionAlgorithm>()
            .expect_err("snappy unsupported");
        assert_eq!(err.input(), "snappy");
        assert_eq!(err.to_string(), "unsupported compression algorithm: snappy");
    }

    #[test]
    fn display_matches_name() {
        assert_eq!(CompressionAlgorithm::Lz4.to_string(), "lz4");
    }
}
