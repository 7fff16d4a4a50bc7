//! Background synchronization loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::service::ComicService;

/// Run [`ComicService::run_scheduled_sync`] every `period` until the task is dropped.
///
/// The first pass starts immediately. A failed pass is logged and the loop
/// keeps going.
pub fn start(service: Arc<ComicService>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(period_secs = period.as_secs(), "comic scheduler started");
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if let Err(e) = service.run_scheduled_sync().await {
                tracing::warn!(error = %e, "scheduled sync failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::service;

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_passes() {
        let (service, stubs, store) = service(&["A", "B"]);
        let handle = start(Arc::new(service), Duration::from_secs(60));

        // First tick fires immediately; the sleep resolves once the pass is idle.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(store.keys().await.len(), 3);
        assert!(stubs.iter().all(|s| s.calls() == 1));

        // Later ticks find everything fresh and fetch nothing.
        tokio::time::advance(Duration::from_secs(60 * 3)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(stubs.iter().all(|s| s.calls() == 1));
        assert!(!handle.is_finished());

        handle.abort();
    }
}
