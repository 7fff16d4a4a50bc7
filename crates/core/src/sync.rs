//! Cache synchronization engine.
//!
//! A pass loads the aggregate snapshot, refetches every configured comic the
//! freshness check rejects, merges the results, drops entries for comics that
//! are no longer configured and writes the snapshot back if anything changed.
//!
//! ### Concurrency
//! - Fetches run in a `JoinSet`, bounded by a semaphore.
//! - A failing or panicking fetch only affects its own comic.
//! - Merging happens after every fetch has finished, on a single task.
//!
//! ### Error retention
//! A fetch that produced errors does not replace an existing entry younger
//! than the retention window (24h by default). Older entries are overwritten
//! even by another error so the stored error reflects the current failure.
//!
//! Separate passes do not lock each other out; the last write wins.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::Error;
use crate::cache::{CacheStore, SNAPSHOT_KEY, entry_key};
use crate::freshness::duration_ms;
use crate::model::{Comic, ComicSnapshot, now_millis};
use crate::provider::ComicProvider;

/// Default error-retention threshold.
pub const RETENTION_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Default size of the per-pass task group.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Counters describing one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SyncReport {
    /// Entries the freshness check accepted without a fetch.
    pub fresh: usize,
    /// Fetched results merged into the snapshot.
    pub fetched: usize,
    /// Failing fetches discarded in favour of a recent entry.
    pub retained: usize,
    /// Entries dropped because their comic is no longer configured.
    pub removed: usize,
    /// Whether the snapshot was written back.
    pub persisted: bool,
}

/// Snapshot after a pass plus what the pass did.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub snapshot: ComicSnapshot,
    pub report: SyncReport,
}

/// Outcome of applying error retention to a fresh fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Merge {
    Replace(Comic),
    Retain,
}

/// Decide whether `fetched` replaces `previous`.
pub fn merge_decision(previous: Option<&Comic>, fetched: Comic, now_ms: i64, retention_window: Duration) -> Merge {
    match previous {
        Some(prev) if fetched.has_errors() && prev.age(now_ms) < duration_ms(retention_window) => Merge::Retain,
        _ => Merge::Replace(fetched),
    }
}

/// Owns snapshot reads, merges and writes against a [`CacheStore`].
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn CacheStore>,
    retention_window: Duration,
    max_concurrency: usize,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store, retention_window: RETENTION_WINDOW, max_concurrency: DEFAULT_MAX_CONCURRENCY }
    }

    pub fn with_retention_window(mut self, retention_window: Duration) -> Self {
        self.retention_window = retention_window;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Read the aggregate snapshot. A missing key is an empty snapshot.
    pub async fn load_snapshot(&self) -> Result<ComicSnapshot, Error> {
        match self.store.get(SNAPSHOT_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(ComicSnapshot::new()),
        }
    }

    /// Read one comic from its mirror key without touching the network.
    pub async fn cached(&self, name: &str) -> Result<Option<Comic>, Error> {
        match self.store.get(&entry_key(name)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Run one synchronization pass over `providers`.
    ///
    /// Only store failures are returned as errors.
    pub async fn synchronize<F>(&self, providers: &[Arc<dyn ComicProvider>], is_fresh: F) -> Result<SyncOutcome, Error>
    where
        F: Fn(&Comic) -> bool,
    {
        let mut snapshot = self.load_snapshot().await?;
        let mut report = SyncReport::default();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set = JoinSet::new();
        let mut in_flight = HashMap::new();

        for provider in providers {
            if let Some(existing) = snapshot.get(provider.name())
                && is_fresh(existing)
            {
                tracing::debug!(source = %provider.name(), "up to date");
                report.fresh += 1;
                continue;
            }

            tracing::debug!(source = %provider.name(), "loading comic");
            let semaphore = semaphore.clone();
            let task_provider = provider.clone();
            let handle = join_set.spawn(async move {
                // NOTE: Hold permit for task duration to enforce concurrency limit
                let _permit = semaphore.acquire_owned().await.ok();
                task_provider.fetch().await
            });
            in_flight.insert(handle.id(), provider.clone());
        }

        let mut fetched = Vec::with_capacity(in_flight.len());
        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((id, comic)) => {
                    if let Some(provider) = in_flight.remove(&id) {
                        fetched.push((provider, comic));
                    }
                }
                Err(e) => {
                    let Some(provider) = in_flight.remove(&e.id()) else { continue };
                    tracing::warn!(source = %provider.name(), error = %e, "fetch task failed");
                    let comic = Comic::failed(
                        provider.name(),
                        provider.link_url(),
                        format!("fetch task failed: {e}"),
                        Vec::new(),
                        now_millis(),
                    );
                    fetched.push((provider, comic));
                }
            }
        }

        let now = now_millis();
        let mut changed = Vec::new();
        for (provider, comic) in fetched {
            let name = provider.name().to_string();
            if comic.has_errors() {
                tracing::warn!(source = %name, errors = ?comic.data.errors, "comic fetched with errors");
            }
            match merge_decision(snapshot.get(&name), comic, now, self.retention_window) {
                Merge::Retain => {
                    tracing::info!(source = %name, "keeping previous entry over failed fetch");
                    report.retained += 1;
                }
                Merge::Replace(comic) => {
                    tracing::debug!(source = %name, "done loading comic");
                    snapshot.insert(name.clone(), comic);
                    changed.push(name);
                    report.fetched += 1;
                }
            }
        }

        let configured: HashSet<&str> = providers.iter().map(|p| p.name()).collect();
        let removed: Vec<String> = snapshot
            .keys()
            .filter(|name| !configured.contains(name.as_str()))
            .cloned()
            .collect();
        for name in &removed {
            tracing::info!(source = %name, "dropping unconfigured comic");
            snapshot.remove(name);
        }
        report.removed = removed.len();

        if !changed.is_empty() || !removed.is_empty() {
            self.persist(&snapshot, &changed, &removed).await?;
            report.persisted = true;
        }

        tracing::info!(
            fresh = report.fresh,
            fetched = report.fetched,
            retained = report.retained,
            removed = report.removed,
            persisted = report.persisted,
            "synchronization pass complete"
        );

        Ok(SyncOutcome { snapshot, report })
    }

    /// Refresh a single comic under the same freshness and retention rules.
    ///
    /// Returns the entry that is current after the refresh. A fresh per-comic
    /// mirror is served without reading the aggregate. Other entries in the
    /// snapshot are left as they are.
    pub async fn refresh_one<F>(&self, provider: &dyn ComicProvider, is_fresh: F) -> Result<Comic, Error>
    where
        F: Fn(&Comic) -> bool,
    {
        let name = provider.name().to_string();
        if let Some(mirrored) = self.cached(&name).await?
            && is_fresh(&mirrored)
        {
            tracing::debug!(source = %name, "up to date");
            return Ok(mirrored);
        }

        let mut snapshot = self.load_snapshot().await?;

        if let Some(existing) = snapshot.get(&name)
            && is_fresh(existing)
        {
            tracing::debug!(source = %name, "up to date");
            return Ok(existing.clone());
        }

        tracing::debug!(source = %name, "loading comic");
        let comic = provider.fetch().await;

        match merge_decision(snapshot.get(&name), comic, now_millis(), self.retention_window) {
            Merge::Retain => {
                tracing::info!(source = %name, "keeping previous entry over failed fetch");
                snapshot.remove(&name).ok_or_else(|| Error::UnknownSource(name.clone()))
            }
            Merge::Replace(comic) => {
                snapshot.insert(name.clone(), comic.clone());
                self.persist(&snapshot, std::slice::from_ref(&name), &[]).await?;
                Ok(comic)
            }
        }
    }

    /// Write the snapshot and the mirrors of `changed`, and drop the mirrors
    /// of `removed`, in one unit.
    async fn persist(&self, snapshot: &ComicSnapshot, changed: &[String], removed: &[String]) -> Result<(), Error> {
        let mut entries: Vec<(String, Value)> = Vec::with_capacity(changed.len() + 1);
        entries.push((SNAPSHOT_KEY.to_string(), serde_json::to_value(snapshot)?));
        for name in changed {
            if let Some(comic) = snapshot.get(name) {
                entries.push((entry_key(name), serde_json::to_value(comic)?));
            }
        }

        let stale: Vec<String> = removed.iter().map(|name| entry_key(name)).collect();

        tracing::info!(
            entries = snapshot.len(),
            changed = changed.len(),
            removed = removed.len(),
            "saving updated comics"
        );
        self.store.write_batch(&entries, &stale).await
    }
}
