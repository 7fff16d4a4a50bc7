//! Serving-side entry points over the sync engine.

use std::sync::Arc;

use funnies_core::{
    AppConfig, CacheStore, Comic, ComicProvider, Error, FreshnessPolicy, SyncEngine, SyncReport,
};

/// The configured comics, their cache and the freshness rules applied to them.
pub struct ComicService {
    engine: SyncEngine,
    providers: Vec<Arc<dyn ComicProvider>>,
    on_demand: FreshnessPolicy,
    scheduled: FreshnessPolicy,
}

impl ComicService {
    pub fn new(store: Arc<dyn CacheStore>, providers: Vec<Arc<dyn ComicProvider>>, config: &AppConfig) -> Self {
        let engine = SyncEngine::new(store)
            .with_retention_window(config.retention_window())
            .with_max_concurrency(config.max_concurrency);

        Self { engine, providers, on_demand: config.on_demand_policy(), scheduled: config.scheduled_policy() }
    }

    /// Configured source names, in display order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Every configured comic, refreshing whatever is stale for an interactive reader.
    pub async fn list_all(&self) -> Result<Vec<Comic>, Error> {
        let policy = self.on_demand;
        let outcome = self.engine.synchronize(&self.providers, |c| policy.is_fresh(c)).await?;

        tracing::debug!(report = ?outcome.report, "served comic list");

        let mut snapshot = outcome.snapshot;
        Ok(self.providers.iter().filter_map(|p| snapshot.remove(p.name())).collect())
    }

    /// One comic, refreshed on its own if stale.
    pub async fn get_one(&self, name: &str) -> Result<Comic, Error> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| Error::UnknownSource(name.to_string()))?;

        let policy = self.on_demand;
        self.engine.refresh_one(provider.as_ref(), |c| policy.is_fresh(c)).await
    }

    /// Background pass: refresh ahead of the on-demand interval.
    pub async fn run_scheduled_sync(&self) -> Result<SyncReport, Error> {
        tracing::info!("running scheduled sync");

        let policy = self.scheduled;
        let outcome = self.engine.synchronize(&self.providers, |c| policy.is_fresh(c)).await?;

        tracing::info!(
            fresh = outcome.report.fresh,
            fetched = outcome.report.fetched,
            retained = outcome.report.retained,
            removed = outcome.report.removed,
            persisted = outcome.report.persisted,
            "scheduled sync finished"
        );
        Ok(outcome.report)
    }
}
