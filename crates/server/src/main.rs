//! mcp-offgrid server entry point.
//!
//! Boots the offline-first fetch mediator behind an MCP server on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use offgrid_client::{FetchClient, FetchConfig, Manifest, ServiceWorker};
use offgrid_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use url::Url;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let origin = Url::parse(&config.origin).context("parsing origin")?;
    let db = CacheDb::open(&config.db_path).await?;
    let client = FetchClient::new(FetchConfig::from(&config))?;
    let worker = Arc::new(ServiceWorker::new(db, client, Manifest::default(), origin));

    tracing::info!(
        origin = %config.origin,
        db = %config.db_path.display(),
        "Starting mcp-offgrid server on stdio transport"
    );

    let handler = handler::McpOffgridServer::new(Arc::clone(&worker));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    worker.flush().await;

    Ok(())
}
