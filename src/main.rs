//! wanicache - an incremental WaniKani cache updater.
//!
//! Mirrors reviews, subjects, and assignments from the WaniKani v2 API into
//! a local SQLite database, fetching only the records updated since the
//! last run. Intended to be re-invoked periodically by an external
//! scheduler; runs are idempotent and safe to repeat after any failure.

mod api;
mod config;
mod models;
mod store;
mod sync;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::ApiClient;
use config::Config;
use store::CacheStore;
use sync::SyncEngine;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env()?;

    let store = CacheStore::open(&config.database_path)?;
    store.ensure_schema()?;

    let client = ApiClient::new(config.api_key.clone())?;
    let mut engine = SyncEngine::new(client, store);

    info!(database = %config.database_path.display(), "Updating cache");
    engine.run().await?;
    info!("Done");

    Ok(())
}
