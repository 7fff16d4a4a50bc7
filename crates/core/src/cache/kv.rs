//! Key-value operations on the SQLite cache.

use super::CacheStore;
use super::connection::CacheDb;
use crate::Error;
use async_trait::async_trait;
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const UPSERT: &str = "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at";

#[async_trait]
impl CacheStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let key = key.to_string();
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0));

                match result {
                    Ok(v) => Ok(Some(v)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(|s| serde_json::from_str(&s).map_err(Error::from)).transpose()
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), Error> {
        self.put_many(&[(key.to_string(), value.clone())]).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.write_batch(&[], &[key.to_string()]).await
    }

    /// Upserts and deletes run in a single transaction.
    async fn write_batch(&self, puts: &[(String, Value)], deletes: &[String]) -> Result<(), Error> {
        let rows = puts
            .iter()
            .map(|(k, v)| Ok((k.clone(), serde_json::to_string(v)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        let deletes = deletes.to_vec();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut upsert = tx.prepare(UPSERT)?;
                    for (key, value) in &rows {
                        upsert.execute(params![key, value, now])?;
                    }
                    let mut delete = tx.prepare("DELETE FROM kv WHERE key = ?1")?;
                    for key in &deletes {
                        delete.execute(params![key])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

impl CacheDb {
    /// Number of keys currently stored.
    pub async fn key_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("comics.json", &json!({"XKCD": {"updated": 1}})).await.unwrap();

        let value = db.get("comics.json").await.unwrap().unwrap();
        assert_eq!(value["XKCD"]["updated"], 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get("nonexistent").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("k", &json!(1)).await.unwrap();
        db.put("k", &json!(2)).await.unwrap();

        assert_eq!(db.get("k").await.unwrap(), Some(json!(2)));
        assert_eq!(db.key_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_many() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![("a".to_string(), json!("one")), ("b".to_string(), json!("two"))];
        db.put_many(&entries).await.unwrap();

        assert_eq!(db.key_count().await.unwrap(), 2);
        assert_eq!(db.get("b").await.unwrap(), Some(json!("two")));
    }

    #[tokio::test]
    async fn test_write_batch_deletes_in_same_commit() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_many(&[("comic:Old".to_string(), json!(1)), ("comics.json".to_string(), json!({}))])
            .await
            .unwrap();

        db.write_batch(&[("comics.json".to_string(), json!({"A": 1}))], &["comic:Old".to_string()])
            .await
            .unwrap();

        assert_eq!(db.key_count().await.unwrap(), 1);
        assert!(db.get("comic:Old").await.unwrap().is_none());
        assert_eq!(db.get("comics.json").await.unwrap(), Some(json!({"A": 1})));

        db.delete("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_value_is_store_error() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.conn
            .call(|conn| {
                conn.execute(
                    "INSERT INTO kv (key, value, updated_at) VALUES ('bad', 'not json', '')",
                    [],
                )
            })
            .await
            .unwrap();

        let err = db.get("bad").await.unwrap_err();
        assert!(err.is_store_error());
    }
}
