use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
