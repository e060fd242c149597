use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::core::value::{CacheValue, Json};

/// Cache-specific error type that doesn't depend on Redis
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache unreachable: {0}")]
    Connection(String),

    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Byte-level cache store shared by request handlers and the invalidation
/// consumer. Values are opaque payloads; every entry carries its own expiry.
#[async_trait]
pub trait CacheTrait: Send + Sync {
    /// Get value from cache, `None` when absent or expired
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>>;

    /// Set value with expiration, replacing any previous entry
    async fn set_with_ttl(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()>;

    /// Remove key from cache, true when it existed
    async fn remove(&self, key: &str) -> CacheResult<bool>;

    /// Enumerate keys matching a glob pattern
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;

    /// Remove every listed key, returning how many existed
    async fn remove_many(&self, keys: &[String]) -> CacheResult<u64> {
        let mut removed = 0;
        for key in keys {
            if self.remove(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Typed JSON access on top of any [`CacheTrait`]
#[async_trait]
pub trait CacheJsonExt {
    async fn get_json<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Serialize + Send + Sync;

    async fn set_json<T>(
        &self, key: &str, value: &T, ttl: Duration,
    ) -> CacheResult<()>
    where
        T: DeserializeOwned + Serialize + Send + Sync;
}

#[async_trait]
impl<C> CacheJsonExt for C
where
    C: CacheTrait + ?Sized,
{
    async fn get_json<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        match self.get(key).await? {
            Some(bytes) => {
                Json::<T>::from_bytes(&bytes)
                    .map(|Json(value)| Some(value))
                    .map_err(|e| CacheError::DeserializationError(e.to_string()))
            }
            None => Ok(None),
        }
    }

    async fn set_json<T>(
        &self, key: &str, value: &T, ttl: Duration,
    ) -> CacheResult<()>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;
        self.set_with_ttl(key, Bytes::from(bytes), ttl).await
    }
}
