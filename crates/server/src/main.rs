//! shellcache server entry point.
//!
//! Boots the offline worker (install, then activate when skip-waiting was
//! requested) and serves it as an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchClient, FetchConfig, OfflineWorker, WorkerConfig};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        origin = config.origin.as_str(),
        version = config.version.as_str(),
        db = %config.db_path.display(),
        "Starting shellcache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let worker = OfflineWorker::new(WorkerConfig::from_app(&config)?, db, Arc::new(network));

    let (installed, activated) = worker.start().await?;
    tracing::info!(cached = installed.cached.len(), failed = installed.failed.len(), "install finished");
    if let Some(report) = activated {
        tracing::info!(deleted = report.deleted.len(), claimed = report.claimed, "activated");
    }

    let handler = handler::ShellCacheServer::new(Arc::new(worker));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
