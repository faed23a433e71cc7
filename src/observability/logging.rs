//! Structured logging initialization.
//!
//! Uses the tracing crate; the configured level acts as the default and
//! `RUST_LOG` overrides it.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
pub fn init(log_level: &str) {
    let default_filter = format!("searchgate={},tower_http=warn", log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
