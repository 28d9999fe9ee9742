//! Logging init: structured events to stderr, filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,zipfetch=info";

/// Install the global subscriber. `quiet` drops the default to errors only;
/// an explicit `RUST_LOG` always wins.
pub fn init_logging(quiet: bool) {
    let fallback = if quiet { "error" } else { DEFAULT_FILTER };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A subscriber may already be installed (e.g. by an embedding test).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
