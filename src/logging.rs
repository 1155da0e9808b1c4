//! Tracing subscriber setup for the `slot-inspect` binary.
//!
//! Logs go to stderr so that resolved values (and `--json` output) on stdout stay
//! machine readable. `RUST_LOG` overrides the default level.

use std::io::{self, IsTerminal};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the global subscriber. `json` switches to one JSON object per event.
pub fn init(json: bool) -> eyre::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(DEFAULT_LOG_LEVEL)
            .map_err(|e| eyre::eyre!("invalid log filter: {e}"))?,
    };

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()
            .map_err(|e| eyre::eyre!("failed to install tracing subscriber: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_ansi(io::stderr().is_terminal())
                    .with_target(false)
                    .with_writer(io::stderr),
            )
            .try_init()
            .map_err(|e| eyre::eyre!("failed to install tracing subscriber: {e}"))?;
    }
    Ok(())
}
