// 📝 Logging - tracing subscriber shared by every binary
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when RUST_LOG is unset
pub const DEFAULT_DIRECTIVE: &str = "workforce_insights=info";

/// Install the global subscriber. Logs go to stderr so report output on
/// stdout stays clean for piping.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // A second init (tests, embedded use) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
