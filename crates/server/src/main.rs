//! larder worker entry point.
//!
//! Boots the worker on the MCP stdio transport. The configured version is
//! resumed from the cache database or installed before the first request.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use larder_client::{FetchClient, FetchConfig};
use larder_core::{AppConfig, CacheDb, CacheStores};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod host;
mod runtime;
#[cfg(test)]
mod testing;
mod tools;
mod worker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, version = %config.cache_version, db = %config.db_path.display(), "starting larder worker on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let stores = CacheStores::new(Arc::new(db));
    let network = FetchClient::new(FetchConfig::from_app_config(&config)?)?;

    let runtime = Arc::new(runtime::Runtime::new(config, stores, Arc::new(network)));
    runtime.bootstrap().await;

    let server = serve_server(handler::WorkerServer::new(Arc::clone(&runtime)), stdio()).await?;
    server.waiting().await?;

    runtime.shutdown().await;
    tracing::info!("larder worker stopped");

    Ok(())
}
