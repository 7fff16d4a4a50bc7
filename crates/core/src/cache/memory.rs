//! In-memory cache store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::CacheStore;
use crate::Error;

/// Process-local store backed by a `HashMap`.
///
/// Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), Error> {
        self.entries.write().await.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn write_batch(&self, puts: &[(String, Value)], deletes: &[String]) -> Result<(), Error> {
        let mut map = self.entries.write().await;
        for (key, value) in puts {
            map.insert(key.clone(), value.clone());
        }
        for key in deletes {
            map.remove(key);
        }
        Ok(())
    }
}
