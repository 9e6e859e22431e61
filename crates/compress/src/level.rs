//! Codec-independent compression levels.
//!
//! Levels are expressed on the familiar `1..=9` scale and translated by each
//! codec into its own tuning knobs (block size for LZ4, level for Zstandard).

use std::num::NonZeroU8;

/// Compression levels recognised by every codec.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum CompressionLevel {
    /// Favour speed over compression ratio.
    Fast,
    /// Balanced speed and ratio.
    #[default]
    Default,
    /// Favour the best compression ratio.
    Best,
    /// An explicit level in the range `1..=9`.
    Precise(NonZeroU8),
}

impl CompressionLevel {
    /// Creates a [`CompressionLevel::Precise`] value from an explicit numeric level.
    ///
    /// The supplied `level` must fall within the inclusive range `1..=9`.
    pub fn from_numeric(level: u32) -> Result<Self, CompressionLevelError> {
        if !(1..=9).contains(&level) {
            return Err(CompressionLevelError::new(level));
        }
        u8::try_from(level)
            .ok()
            .and_then(NonZeroU8::new)
            .map(Self::Precise)
            .ok_or(CompressionLevelError::new(level))
    }

    /// Returns the level on the `1..=9` scale.
    #[must_use]
    pub const fn numeric(self) -> u8 {
        match self {
            Self::Fast => 1,
            Self::Default => 6,
            Self::Best => 9,
            Self::Precise(value) => value.get(),
        }
    }
}

/// Error returned when a requested level falls outside `1..=9`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("compression level {level} is outside the supported range 1-9")]
pub struct CompressionLevelError {
    level: u32,
}

impl CompressionLevelError {
    const fn new(level: u32) -> Self {
        Self { level }
    }

    /// Returns the rejected level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_numeric_accepts_supported_range() {
        for level in 1..=9 {
            let parsed = CompressionLevel::from_numeric(level).expect("valid level");
            assert_eq!(u32::from(parsed.numeric()), level);
        }
    }

    #[test]
    fn from_numeric_rejects_zero_and_overflow() {
        assert_eq!(CompressionLevel::from_numeric(0).unwrap_err().level(), 0);
        let err = CompressionLevel::from_numeric(10).unwrap_err();
        assert_eq!(
            err.to_string(),
            "compression level 10 is outside the supported range 1-9"
        );
    }

    #[test]
    fn named_levels_map_onto_numeric_scale() {
        assert_eq!(CompressionLevel::Fast.numeric(), 1);
        assert_eq!(CompressionLevel::default().numeric(), 6);
        assert_eq!(CompressionLevel::Best.numeric(), 9);
    }
}
