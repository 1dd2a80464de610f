pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod policy;
pub mod repository;
pub mod routes;
pub mod search;
pub mod tree;

pub use config::Config;
pub use db::DbPool;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the fmt subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
