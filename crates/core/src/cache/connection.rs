//! Opening the cache database.

use std::path::Path;
use std::time::Duration;

use tokio_rusqlite::Connection;

use super::migrations;
use crate::Error;

/// Applied on every open.
const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA temp_store = MEMORY;";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite cache.
///
/// Statements run on the connection's background thread. Clones share it.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open or create the database file at `path` and migrate it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let conn = Connection::open(path).await?;
        tracing::debug!(path = %path.display(), "opened cache database");
        Self::prepare(conn).await
    }

    /// Private in-memory database, gone when the last clone drops.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch(PRAGMAS)
        })
        .await?;

        migrations::run(&conn).await?;
        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, SNAPSHOT_KEY};
    use serde_json::json;

    #[tokio::test]
    async fn test_open_in_memory_is_usable() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert_eq!(db.key_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reopen_file_keeps_data() {
        let dir = std::env::temp_dir().join(format!("funnies-open-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cache.sqlite");

        let db = CacheDb::open(&path).await.unwrap();
        db.put(SNAPSHOT_KEY, &json!({})).await.unwrap();
        drop(db);

        let reopened = CacheDb::open(&path).await.unwrap();
        assert_eq!(reopened.get(SNAPSHOT_KEY).await.unwrap(), Some(json!({})));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
