use std::{future::Future, sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use super::r#trait::{CacheError, CacheJsonExt, CacheTrait};

/// Read-through wrapper: serve from cache, fall back to the loader on a
/// miss and populate the cache with what it returned.
///
/// Cache failures never fail a read. When the cache cannot be reached the
/// loader runs and its result is returned uncached; a failed write after a
/// successful load is logged and ignored. Loader errors are returned as-is
/// and are never cached, so a not-found stays a not-found.
#[derive(Clone)]
pub struct ReadThrough {
    cache: Arc<dyn CacheTrait>,
    ttl: Duration,
}

/// How a read was served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    Cache,
    Loader,
    /// Cache lookup failed, the loader result was not stored
    Fallback,
}

impl ReadThrough {
    pub fn new(cache: Arc<dyn CacheTrait>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Default TTL for entries populated by this wrapper
    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn cache(&self) -> &Arc<dyn CacheTrait> { &self.cache }

    pub async fn get_or_load<T, E, F, Fut>(
        &self, key: &str, ttl: Duration, loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        self.get_or_load_traced(key, ttl, loader)
            .await
            .map(|(value, _)| value)
    }

    /// Like [`ReadThrough::get_or_load`] but also reports where the value
    /// came from.
    #[instrument(skip(self, loader), fields(cache.key = key))]
    pub async fn get_or_load_traced<T, E, F, Fut>(
        &self, key: &str, ttl: Duration, loader: F,
    ) -> Result<(T, ReadSource), E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        match self.cache.get_json::<T>(key).await {
            Ok(Some(value)) => {
                debug!("Cache hit for {}", key);
                return Ok((value, ReadSource::Cache));
            }
            Ok(None) => debug!("Cache miss for {}, loading", key),
            Err(CacheError::DeserializationError(e)) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
            }
            Err(e) => {
                warn!(
                    "Cache lookup for {} failed, serving uncached: {}",
                    key, e
                );
                let value = loader().await?;
                return Ok((value, ReadSource::Fallback));
            }
        }

        let value = loader().await?;

        if let Err(e) = self.cache.set_json(key, &value, ttl).await {
            warn!("Failed to populate cache entry {}: {}", key, e);
        }

        Ok((value, ReadSource::Loader))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;

    use super::*;
    use crate::cache::memory::MemoryCache;

    const TTL: Duration = Duration::from_secs(3600);

    fn wrapper() -> (Arc<MemoryCache>, ReadThrough) {
        let cache = Arc::new(MemoryCache::default());
        let read_through = ReadThrough::new(cache.clone(), TTL);
        (cache, read_through)
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let (_, read_through) = wrapper();
        let calls = Arc::new(AtomicUsize::new(0));

        let load = || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::convert::Infallible>(vec!["a".to_string()])
            }
        };

        let (first, first_source) = read_through
            .get_or_load_traced("blogs::", TTL, load)
            .await
            .unwrap();
        let (second, second_source) = read_through
            .get_or_load_traced("blogs::", TTL, load)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first_source, ReadSource::Loader);
        assert_eq!(second_source, ReadSource::Cache);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let (cache, read_through) = wrapper();

        let result: Result<String, &str> = read_through
            .get_or_load("blog:missing", TTL, || async { Err("not found") })
            .await;

        assert_eq!(result, Err("not found"));
        assert_eq!(cache.get("blog:missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_replaced() {
        let (cache, read_through) = wrapper();
        cache
            .set_with_ttl("blog:1", Bytes::from_static(b"garbage"), TTL)
            .await
            .unwrap();

        let value: u32 = read_through
            .get_or_load("blog:1", TTL, || async {
                Ok::<_, std::convert::Infallible>(7)
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(
            cache.get("blog:1").await.unwrap(),
            Some(Bytes::from_static(b"7"))
        );
    }
}
