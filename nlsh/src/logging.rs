//! Development-time tracing for debugging the mediator.
//!
//! Kept apart from the session log (`io/session_log`): tracing is controlled by
//! `RUST_LOG` and never persisted, while the session log records goals, model
//! calls, decisions and executed commands on every run.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Used when `RUST_LOG` is unset or unparsable: the mediator's own warnings,
/// and only errors from the HTTP and line-editing stacks underneath it.
const DEFAULT_FILTER: &str = concat!("error,", env!("CARGO_CRATE_NAME"), "=warn");

/// Install the stderr subscriber.
///
/// ```bash
/// RUST_LOG=nlsh=debug nlsh
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(filter_from(std::env::var("RUST_LOG").ok().as_deref()))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
