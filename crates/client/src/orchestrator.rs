//! End-to-end fetch of one source: load, normalize, stamp.

use std::sync::Arc;

use async_trait::async_trait;
use funnies_core::{Comic, ComicProvider, Error, model::now_millis};

use crate::extract::normalize;
use crate::fetch::{FetchClient, canonicalize};
use crate::source::{ComicSource, LoadError};

/// Fetch and normalize one comic. Never fails.
///
/// Relative URLs are resolved against the page the content came from: the
/// last navigated URL for navigating sources, the link URL otherwise.
pub async fn fetch_one(source: &ComicSource, http: &FetchClient) -> Comic {
    let started = std::time::Instant::now();

    let origin = match canonicalize(source.link_url()) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(source = source.name(), error = %e, "invalid link URL");
            let error = Error::InvalidUrl(format!("{}: {e}", source.link_url()));
            return Comic::failed(source.name(), source.link_url(), error.to_string(), Vec::new(), now_millis());
        }
    };

    match source.load(http).await {
        Ok(data) => {
            let page = data
                .intermediate_urls
                .as_ref()
                .and_then(|urls| urls.last())
                .and_then(|last| canonicalize(last).ok())
                .unwrap_or(origin);
            let data = normalize(&page, data);

            tracing::info!(
                source = source.name(),
                media = data.media.len(),
                errors = data.errors.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "loaded comic"
            );

            Comic { name: source.name().to_string(), link_url: source.link_url().to_string(), data, updated: now_millis() }
        }
        Err(LoadError { error, intermediate_urls }) => {
            tracing::warn!(source = source.name(), error = %error, "failed to load comic");
            Comic::failed(source.name(), source.link_url(), error.to_string(), intermediate_urls, now_millis())
        }
    }
}

/// A [`ComicSource`] bound to the shared HTTP client.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    source: ComicSource,
    http: Arc<FetchClient>,
}

impl SourceFetcher {
    pub fn new(source: ComicSource, http: Arc<FetchClient>) -> Self {
        Self { source, http }
    }

    pub fn source(&self) -> &ComicSource {
        &self.source
    }
}

#[async_trait]
impl ComicProvider for SourceFetcher {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn link_url(&self) -> &str {
        self.source.link_url()
    }

    async fn fetch(&self) -> Comic {
        fetch_one(&self.source, &self.http).await
    }
}

/// Bind every source to `http`, preserving order.
pub fn providers(sources: Vec<ComicSource>, http: &Arc<FetchClient>) -> Vec<Arc<dyn ComicProvider>> {
    sources
        .into_iter()
        .map(|source| Arc::new(SourceFetcher::new(source, Arc::clone(http))) as Arc<dyn ComicProvider>)
        .collect()
}
