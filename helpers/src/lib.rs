use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is not set, so that the limiter's own
/// trace events are visible in demos built with `--features tracing`.
const DEFAULT_DIRECTIVE: &str = "drip_limiter=trace";

/// Initialize logging for a given demo.
pub fn init_logging() {
    use tracing_subscriber::prelude::*;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .compact(),
        )
        .init();
}
