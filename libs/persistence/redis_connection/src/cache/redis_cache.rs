use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::{
    Connection, Pool, PoolError,
    redis::{self, AsyncCommands, RedisError},
};

use super::r#trait::{CacheError, CacheResult, CacheTrait};

/// Keys fetched per `SCAN` round trip
const SCAN_BATCH: usize = 500;

/// Redis cache implementation using deadpool Redis pool
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub fn new(pool: Pool) -> Self { Self { pool } }

    async fn connection(&self) -> CacheResult<Connection> {
        self.pool.get().await.map_err(pool_error)
    }
}

fn pool_error(e: PoolError) -> CacheError { CacheError::Connection(e.to_string()) }

fn redis_error(e: RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
        CacheError::Connection(e.to_string())
    }
    else {
        CacheError::Backend(e.to_string())
    }
}

#[async_trait]
impl CacheTrait for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(redis_error)?;
        Ok(value.map(Bytes::from))
    }

    async fn set_with_ttl(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(key, value.to_vec(), seconds as _)
            .await
            .map_err(redis_error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        let count: u64 = conn.del(key).await.map_err(redis_error)?;
        Ok(count > 0)
    }

    /// Walks the keyspace with `SCAN MATCH` so large keyspaces never block
    /// the server the way `KEYS` would.
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(redis_error)?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn remove_many(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        let count: u64 = conn.del(keys).await.map_err(redis_error)?;
        Ok(count)
    }
}
