//! In-memory cache backed by moka
//!
//! Values are stored as JSON so any serializable response can be cached
//! under a string key. Entries expire after the configured TTL.

use anyhow::{Context, Result};
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
struct CacheEntry {
    json: Arc<String>,
}

pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl MemoryCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => {
                let value = serde_json::from_str(&entry.json).context("Failed to decode cached value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to encode cache value")?;
        self.cache
            .insert(key.to_string(), CacheEntry { json: Arc::new(json) })
            .await;
        Ok(())
    }

    pub async fn delete(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Drop every key starting with `prefix`
    pub async fn delete_prefix(&self, prefix: &str) {
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| (*key).clone())
            .collect();
        for key in keys {
            self.cache.invalidate(&key).await;
        }
    }

    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> MemoryCache {
        MemoryCache::new(100, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_set_and_get_struct() {
        let cache = cache();
        cache.set("news:list:1:10", &vec![1, 2, 3]).await.unwrap();
        let value: Option<Vec<i32>> = cache.get("news:list:1:10").await.unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_delete_prefix_leaves_other_keys() {
        let cache = cache();
        cache.set("news:list:1:10", &1).await.unwrap();
        cache.set("news:slug:budget", &2).await.unwrap();
        cache.set("speech:list:1:10", &3).await.unwrap();

        cache.delete_prefix("news:").await;

        assert!(cache.get::<i32>("news:list:1:10").await.unwrap().is_none());
        assert!(cache.get::<i32>("news:slug:budget").await.unwrap().is_none());
        assert_eq!(cache.get::<i32>("speech:list:1:10").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MemoryCache::new(100, Duration::from_millis(10));
        cache.set("site", &"Podium").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get::<String>("site").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = cache();
        cache.set("a", &1).await.unwrap();
        cache.set("b", &2).await.unwrap();
        cache.clear().await;
        assert_eq!(cache.entry_count().await, 0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(20))]

            #[test]
            fn property_cached_value_round_trips(key in "[a-z:]{1,20}", value in ".{0,100}") {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let cache = MemoryCache::new(100, Duration::from_secs(60));
                    cache.set(&key, &value).await.unwrap();
                    let got: Option<String> = cache.get(&key).await.unwrap();
                    prop_assert_eq!(got, Some(value.clone()));
                    Ok(())
                })?;
            }
        }
    }
}
