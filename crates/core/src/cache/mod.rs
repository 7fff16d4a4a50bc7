//! Cache store for comic snapshots.
//!
//! The engine treats persistence as an abstract key-value store of JSON
//! documents ([`CacheStore`]). Two implementations are provided:
//!
//! - [`CacheDb`]: SQLite with async access via tokio-rusqlite, WAL mode and
//!   automatic schema migrations
//! - [`MemoryStore`]: process-local map for tests and ephemeral runs

pub mod connection;
pub mod kv;
pub mod memory;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;

/// Key holding the aggregate snapshot of every configured comic.
pub const SNAPSHOT_KEY: &str = "comics.json";

/// Key mirroring a single comic's entry.
pub fn entry_key(name: &str) -> String {
    format!("comic:{name}")
}

/// Keyed persistence of JSON documents.
///
/// Writes follow last-writer-wins semantics; there is no compare-and-swap.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a value. `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<Value>, Error>;

    /// Write a single value.
    async fn put(&self, key: &str, value: &Value) -> Result<(), Error>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// Write `puts` and remove `deletes` as one unit.
    ///
    /// The default implementation applies them one by one; stores that can
    /// commit atomically should override it.
    async fn write_batch(&self, puts: &[(String, Value)], deletes: &[String]) -> Result<(), Error> {
        for (key, value) in puts {
            self.put(key, value).await?;
        }
        for key in deletes {
            self.delete(key).await?;
        }
        Ok(())
    }

    /// Write several values as one unit.
    async fn put_many(&self, entries: &[(String, Value)]) -> Result<(), Error> {
        self.write_batch(entries, &[]).await
    }
}
