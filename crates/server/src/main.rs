//! funnies server entry point.
//!
//! Boots the MCP server on stdio transport and, when enabled, the background
//! sync loop. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use funnies_client::{FetchClient, FetchConfig, default_sources, providers};
use funnies_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod scheduler;
mod service;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db_path = %config.db_path.display(), "starting funnies server on stdio transport");

    let store = CacheDb::open(&config.db_path).await?;
    let http = Arc::new(FetchClient::new(FetchConfig::from(&config))?);

    let sources: Vec<_> = default_sources()
        .into_iter()
        .filter(|s| {
            let disabled = config.is_disabled(s.name());
            if disabled {
                tracing::info!(source = s.name(), "source disabled");
            }
            !disabled
        })
        .collect();

    let service = Arc::new(service::ComicService::new(Arc::new(store), providers(sources, &http), &config));

    let background = config
        .scheduler_enabled
        .then(|| scheduler::start(Arc::clone(&service), config.scheduler_period()));

    let handler = handler::FunniesServer::new(service);
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    if let Some(task) = background {
        task.abort();
    }

    Ok(())
}
