//! The seam between the sync engine and whatever fetches a comic.

use async_trait::async_trait;

use crate::model::Comic;

/// A configured comic that can be fetched end to end.
///
/// `fetch` never fails: fetch and extraction problems are reported as a
/// [`Comic`] whose `data.errors` is non-empty.
#[async_trait]
pub trait ComicProvider: Send + Sync {
    /// Stable, unique source name. Used as the snapshot key.
    fn name(&self) -> &str;

    /// Page a reader is sent to for this comic.
    fn link_url(&self) -> &str;

    async fn fetch(&self) -> Comic;
}
