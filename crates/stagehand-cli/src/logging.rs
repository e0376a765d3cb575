//! tracing-subscriber の初期化

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Console logging. `RUST_LOG` wins over the configured level.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_filter(filter),
    );

    // a global subscriber may already be set (e.g. by an embedding host)
    if subscriber.try_init().is_err() {
        tracing::debug!("global tracing subscriber already initialized");
    }
}
