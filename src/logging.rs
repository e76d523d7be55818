//! Subscriber setup for binaries and notebooks embedding the engine. The
//! library itself only emits events.
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Overrides the level passed to [`init`], using `EnvFilter` directive syntax.
pub const LOG_ENV: &str = "NUDB_LOG";

/// Installs a stderr fmt subscriber filtered at `level` (e.g. `"info"`,
/// `"nudb_core=debug"`). Returns `false` if a global subscriber was already set.
pub fn init(level: &str) -> bool {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| level.to_string());
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));
    tracing_subscriber::registry().with(stderr_layer).try_init().is_ok()
}
