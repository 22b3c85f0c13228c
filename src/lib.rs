//! Library crate for tennis-relay, exposing modules for binaries and integration tests.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
/// Persistence of finished matches.
pub mod dao;
/// Wire and HTTP payloads.
pub mod dto;
pub mod error;
/// HTTP, SSE and websocket route trees.
pub mod routes;
/// Business logic behind the routes.
pub mod services;
pub mod state;
pub mod stations;

/// Install the global tracing subscriber, logging to stderr. `RUST_LOG` wins over
/// `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
