use deadpool_redis::{Connection, Pool, PoolError, redis};

/// Owned handle to the Redis pool, built once at service start and handed
/// to every component that talks to Redis.
#[derive(Clone)]
pub struct RedisConnectionManager {
    pool: Pool,
}

impl RedisConnectionManager {
    pub fn new(pool: Pool) -> Self { Self { pool } }

    pub fn pool(&self) -> &Pool { &self.pool }

    pub async fn get_connection(&self) -> Result<Connection, PoolError> {
        self.pool.get().await
    }

    /// Round-trips a `PING`, used by health checks.
    pub async fn ping(&self) -> Result<(), ConnectionCheckError> {
        let mut conn = self.pool.get().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    /// Available and total connections, for monitoring.
    pub fn status(&self) -> (usize, usize) {
        let status = self.pool.status();
        (status.available, status.size)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionCheckError {
    #[error("Redis pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}
