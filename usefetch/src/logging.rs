//! Logging setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};
use usefetch_store::{LogLevel, ProviderConfig};

/// Builds the filter for `level`. `RUST_LOG` wins when set.
pub fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("usefetch={},warn", level.as_str())))
}

/// Installs a global subscriber writing to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn init(level: LogLevel) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter(level))
        .try_init()
}

/// Installs the global subscriber at the level `config` asks for.
pub fn init_from(config: &ProviderConfig) -> Result<(), TryInitError> {
    init(config.log_level)
}
