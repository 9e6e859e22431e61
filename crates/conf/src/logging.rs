use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{ConfigError, LogConfig};

/// Filter used when the configuration does not set one.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a global `tracing` subscriber with a formatting layer.
///
/// The filter comes from `config`; a valid `RUST_LOG` overrides it. Returns
/// `Ok(false)` when a global subscriber was already installed, leaving it in
/// place.
pub fn init_tracing(config: &LogConfig) -> Result<bool, ConfigError> {
    let configured = EnvFilter::try_new(config.filter())?;
    let filter = EnvFilter::try_from_default_env().unwrap_or(configured);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(target: "tnet::conf", filter = config.filter(), "tracing initialised");
    }
    Ok(installed)
}
