//! Freshness policy for cached comics.
//!
//! An entry is fresh while its age is below `base_interval` plus a random
//! amount drawn from `[0, jitter_window]`. Entries carrying errors ignore the
//! interval and stay fresh only for `error_window`, so failing sources are
//! retried sooner without being hammered.

use std::time::Duration;

use rand::Rng;

use crate::model::{Comic, now_millis};

/// Freshness window applied to entries with errors.
pub const ERROR_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Interval used by interactive list/get requests.
pub const ON_DEMAND_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Interval used by the background pass.
pub const SCHEDULED_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Jitter window used by the background pass.
pub const SCHEDULED_JITTER: Duration = Duration::from_secs(30 * 60);

/// Decides whether a cached entry may be served without refetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    base_interval: Duration,
    jitter_window: Duration,
    error_window: Duration,
}

impl FreshnessPolicy {
    pub fn new(base_interval: Duration, jitter_window: Duration) -> Self {
        Self { base_interval, jitter_window, error_window: ERROR_WINDOW }
    }

    /// 12h, no jitter.
    pub fn on_demand() -> Self {
        Self::new(ON_DEMAND_INTERVAL, Duration::ZERO)
    }

    /// 6h plus up to 30min of jitter.
    pub fn scheduled() -> Self {
        Self::new(SCHEDULED_INTERVAL, SCHEDULED_JITTER)
    }

    pub fn with_error_window(mut self, error_window: Duration) -> Self {
        self.error_window = error_window;
        self
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    pub fn jitter_window(&self) -> Duration {
        self.jitter_window
    }

    pub fn error_window(&self) -> Duration {
        self.error_window
    }

    /// Check freshness against the wall clock with a freshly drawn jitter.
    pub fn is_fresh(&self, comic: &Comic) -> bool {
        let jitter_ms = duration_ms(self.jitter_window);
        let jitter = if jitter_ms > 0 { rand::rng().random_range(0..=jitter_ms) } else { 0 };
        self.is_fresh_at(comic, now_millis(), jitter)
    }

    /// Deterministic core of [`is_fresh`](Self::is_fresh).
    ///
    /// `jitter_ms` is clamped to the policy's jitter window.
    pub fn is_fresh_at(&self, comic: &Comic, now_ms: i64, jitter_ms: i64) -> bool {
        let age = comic.age(now_ms);
        if comic.has_errors() {
            return age < duration_ms(self.error_window);
        }
        let jitter = jitter_ms.clamp(0, duration_ms(self.jitter_window));
        age < duration_ms(self.base_interval).saturating_add(jitter)
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::on_demand()
    }
}

pub(crate) fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComicData, Media};

    const HOUR_MS: i64 = 60 * 60 * 1000;
    const NOW: i64 = 1_700_000_000_000;

    fn ok_comic(age_ms: i64) -> Comic {
        Comic {
            name: "A".into(),
            link_url: "https://a.test/".into(),
            data: ComicData::from_media(vec![Media::image("https://a.test/1.png")]),
            updated: NOW - age_ms,
        }
    }

    fn failed_comic(age_ms: i64) -> Comic {
        Comic::failed("A", "https://a.test/", "HTTP_ERROR: HTTP 500", Vec::new(), NOW - age_ms)
    }

    #[test]
    fn test_fresh_within_interval() {
        let policy = FreshnessPolicy::on_demand();
        assert!(policy.is_fresh_at(&ok_comic(11 * HOUR_MS), NOW, 0));
        assert!(!policy.is_fresh_at(&ok_comic(12 * HOUR_MS), NOW, 0));
    }

    #[test]
    fn test_jitter_extends_interval() {
        let policy = FreshnessPolicy::scheduled();
        let comic = ok_comic(6 * HOUR_MS + 10 * 60 * 1000);
        assert!(!policy.is_fresh_at(&comic, NOW, 0));
        assert!(policy.is_fresh_at(&comic, NOW, 20 * 60 * 1000));
    }

    #[test]
    fn test_jitter_is_clamped_to_window() {
        let policy = FreshnessPolicy::scheduled();
        let comic = ok_comic(7 * HOUR_MS);
        assert!(!policy.is_fresh_at(&comic, NOW, 2 * HOUR_MS));
    }

    #[test]
    fn test_young_error_is_fresh_for_any_interval() {
        let comic = failed_comic(30 * 60 * 1000);
        for hours in [1u64, 6, 12, 48] {
            let policy = FreshnessPolicy::new(Duration::from_secs(hours * 3600), Duration::ZERO);
            assert!(policy.is_fresh_at(&comic, NOW, 0), "interval {hours}h");
        }
    }

    #[test]
    fn test_old_error_is_stale_for_any_interval() {
        let comic = failed_comic(HOUR_MS + 1);
        for hours in [1u64, 6, 12, 48] {
            let policy = FreshnessPolicy::new(Duration::from_secs(hours * 3600), Duration::from_secs(1800));
            assert!(!policy.is_fresh_at(&comic, NOW, 30 * 60 * 1000), "interval {hours}h");
        }
    }

    #[test]
    fn test_custom_error_window() {
        let policy = FreshnessPolicy::on_demand().with_error_window(Duration::from_secs(2 * 3600));
        assert!(policy.is_fresh_at(&failed_comic(90 * 60 * 1000), NOW, 0));
    }

    #[test]
    fn test_is_fresh_wall_clock() {
        let policy = FreshnessPolicy::scheduled();
        let mut comic = ok_comic(0);
        comic.updated = now_millis();
        assert!(policy.is_fresh(&comic));

        comic.updated = now_millis() - 7 * HOUR_MS;
        assert!(!policy.is_fresh(&comic));
    }
}
