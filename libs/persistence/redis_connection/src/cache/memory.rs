use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use moka::{Expiry, future::Cache};

use super::r#trait::{CacheResult, CacheTrait};
use crate::{config::MemoryConfig, core::pattern::glob_match};

#[derive(Clone)]
struct Entry {
    data: Bytes,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self, _key: &String, value: &Entry, _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self, _key: &String, value: &Entry, _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backed by moka, for single-process deployments and
/// tests. Supports pattern enumeration by scanning live entries.
#[derive(Clone)]
pub struct MemoryCache {
    cache: Cache<String, Entry>,
}

impl MemoryCache {
    pub fn new(config: MemoryConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { cache }
    }
}

impl Default for MemoryCache {
    fn default() -> Self { Self::new(MemoryConfig::default()) }
}

#[async_trait]
impl CacheTrait for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        Ok(self.cache.get(key).await.map(|entry| entry.data))
    }

    async fn set_with_ttl(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()> {
        self.cache
            .insert(key.to_string(), Entry { data: value, ttl })
            .await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.as_ref().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::default();

        cache
            .set_with_ttl("blog:1", Bytes::from_static(b"{}"), TTL)
            .await
            .unwrap();

        let value = cache.get("blog:1").await.unwrap();
        assert_eq!(value, Some(Bytes::from_static(b"{}")));
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_own_ttl() {
        let cache = MemoryCache::default();

        cache
            .set_with_ttl(
                "short",
                Bytes::from_static(b"1"),
                Duration::from_millis(50),
            )
            .await
            .unwrap();
        cache
            .set_with_ttl("long", Bytes::from_static(b"2"), TTL)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert!(cache.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_keys_by_pattern() {
        let cache = MemoryCache::default();
        for key in ["blogs::", "blogs::Tech", "blogs:rust:", "blog:9"] {
            cache
                .set_with_ttl(key, Bytes::from_static(b"[]"), TTL)
                .await
                .unwrap();
        }

        let keys = cache.keys("blogs:*").await.unwrap();

        assert_eq!(keys, vec!["blogs::", "blogs::Tech", "blogs:rust:"]);
    }

    #[tokio::test]
    async fn test_remove_many_counts_existing_keys() {
        let cache = MemoryCache::default();
        cache
            .set_with_ttl("blog:1", Bytes::from_static(b"{}"), TTL)
            .await
            .unwrap();

        let removed = cache
            .remove_many(&["blog:1".to_string(), "blog:2".to_string()])
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(cache.get("blog:1").await.unwrap(), None);
    }
}
