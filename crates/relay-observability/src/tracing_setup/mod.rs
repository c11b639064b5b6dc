//! Tracing setup: structured logging with span definitions and event helpers.

pub mod events;
pub mod spans;

use relay_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log level.
pub const LOG_ENV: &str = "RELAY_LOG";

/// Install the global subscriber.
///
/// `RELAY_LOG` takes precedence over `config.log_level`. Returns `false`
/// when a subscriber was already installed, leaving it in place.
pub fn init(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json_logs {
        builder
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
