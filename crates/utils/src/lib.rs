use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,hcache=debug";

/// Install the global subscriber. `RUST_LOG` wins over `fallback_filter`.
pub fn init_tracing(fallback_filter: Option<&str>) {
    let fallback = fallback_filter
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
