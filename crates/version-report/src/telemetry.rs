//! Subscriber setup for the `version-report` binary.
//!
//! Diagnostics are written to stderr: `merge`, `targets` and `capture` print
//! their JSON or markdown on stdout, and child processes spawned under
//! `capture` share the same stderr.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the process-wide subscriber for report log events.
///
/// `level` is the fallback verbosity (`--verbose` maps to `DEBUG`); a
/// `RUST_LOG` filter overrides it. `json` switches to one JSON object per
/// event. A subscriber that is already installed is left in place.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
