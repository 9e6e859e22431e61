#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Configuration layer for tnet endpoints.
//!
//! # Overview
//!
//! A JSON document selects the stream codec and write policy, optionally pins
//! the network interface, and sets the log filter:
//!
//! ```json
//! {
//!   "compression": { "algorithm": "lz4", "level": 6, "write_policy": "flush-each-write" },
//!   "network": { "interface": "eth0" },
//!   "log": { "filter": "tnet=debug" }
//! }
//! ```
//!
//! Every field is optional. [`Config::stream_settings`] validates the
//! compression section into [`strm::StreamSettings`], and
//! [`Config::resolve_interface`] falls back to [`detect::default_interface`]
//! when no interface is configured.
//!
//! # Examples
//!
//! ```
//! use conf::Config;
//! use strm::WritePolicy;
//!
//! let config = Config::from_json_str(r#"{"compression": {"write_policy": "buffered"}}"#).unwrap();
//! let settings = config.stream_settings().unwrap();
//! assert_eq!(settings.write_policy(), WritePolicy::Buffered);
//! ```

mod config;
pub mod detect;
mod logging;

pub use config::{CompressionConfig, Config, ConfigError, LogConfig, NetworkConfig};
pub use detect::{DefaultInterface, DetectError, InterfaceAddr};
pub use logging::{DEFAULT_FILTER, init_tracing};
