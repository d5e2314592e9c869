//! Observability (C11).
//!
//! Structured logging init, gated behind the `logging-init` feature so a
//! library consumer embedding this crate isn't forced to accept
//! `tracing-subscriber` as a hard dependency. Mirrors the teacher workspace's
//! `logging::init_logging`/`init_json_logging` pair.

#![cfg(feature = "logging-init")]

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes human-readable logging, honoring `RUST_LOG` with a default
/// floor of `INFO`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init()
}

/// Initializes JSON logging, honoring `RUST_LOG` with a default floor of
/// `INFO`. Suited to piping into an aggregator rather than a terminal.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}
