use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use compress::{
    CompressionAlgorithm, CompressionAlgorithmParseError, CompressionLevel, CompressionLevelError,
};
use serde::{Deserialize, Serialize};
use strm::{StreamSettings, WritePolicy, WritePolicyParseError};
use thiserror::Error;

use crate::detect::{self, DetectError};
use crate::logging::DEFAULT_FILTER;

/// Errors raised while loading or validating a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The document is not valid JSON or does not match the schema.
    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
    /// `compression.algorithm` names an unknown or disabled codec.
    #[error(transparent)]
    Algorithm(#[from] CompressionAlgorithmParseError),
    /// `compression.level` is outside `1..=9`.
    #[error(transparent)]
    Level(#[from] CompressionLevelError),
    /// `compression.write_policy` is not recognised.
    #[error(transparent)]
    WritePolicy(#[from] WritePolicyParseError),
    /// `log.filter` is not a valid tracing filter directive.
    #[error("invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// `compression` section.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// Codec name, `lz4` when absent.
    pub algorithm: Option<String>,
    /// Numeric level in `1..=9`.
    pub level: Option<u32>,
    /// `flush-each-write` (default) or `buffered`.
    pub write_policy: Option<String>,
}

/// `network` section.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Interface to bind; detected when absent.
    pub interface: Option<String>,
}

/// `log` section.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `tracing` filter directives such as `info,tnet::strm=trace`.
    pub filter: Option<String>,
}

impl LogConfig {
    /// Returns the configured filter or [`DEFAULT_FILTER`].
    #[must_use]
    pub fn filter(&self) -> &str {
        self.filter.as_deref().unwrap_or(DEFAULT_FILTER)
    }
}

/// Endpoint configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Stream codec settings.
    pub compression: CompressionConfig,
    /// Network settings.
    pub network: NetworkConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl Config {
    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses the JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Validates the compression section into stream settings.
    pub fn stream_settings(&self) -> Result<StreamSettings, ConfigError> {
        let section = &self.compression;
        let algorithm = match section.algorithm.as_deref() {
            Some(name) => name.parse::<CompressionAlgorithm>()?,
            None => CompressionAlgorithm::default_algorithm(),
        };
        let level = match section.level {
            Some(level) => CompressionLevel::from_numeric(level)?,
            None => CompressionLevel::Default,
        };
        let write_policy = match section.write_policy.as_deref() {
            Some(name) => name.parse::<WritePolicy>()?,
            None => WritePolicy::default(),
        };
        Ok(StreamSettings::new(algorithm)
            .with_level(level)
            .with_write_policy(write_policy))
    }

    /// Returns the configured interface, or the one carrying the default
    /// route when none is configured.
    pub fn resolve_interface(&self) -> Result<String, DetectError> {
        match &self.network.interface {
            Some(name) => Ok(name.clone()),
            None => detect::default_interface().map(|found| found.name),
        }
    }
}
