use std::time::Duration;

use anyhow::{Context, Result};
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use testcontainers_modules::{
    redis::Redis,
    testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner},
};

/// Throwaway Redis server
pub struct TestRedisContainer {
    pub pool: Pool,
    pub connection_string: String,
    pub test_prefix: String,
    // Keep the container alive for the lifetime of this struct
    _container: ContainerAsync<Redis>,
}

impl TestRedisContainer {
    pub async fn new() -> Result<Self> {
        // XAUTOCLAIM needs 6.2 or later
        let container = Redis::default()
            .with_tag("7.2-alpine")
            .start()
            .await
            .context("Failed to start Redis container")?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(6379).await?;
        let connection_string = format!("redis://{host}:{port}");

        let test_prefix = format!("test_{}:", uuid::Uuid::now_v7().simple());
        let pool = Self::create_pool(&connection_string).await?;

        Ok(Self {
            pool,
            connection_string,
            test_prefix,
            _container: container,
        })
    }

    async fn create_pool(connection_string: &str) -> Result<Pool> {
        let mut cfg = Config::from_url(connection_string);
        cfg.pool = Some(PoolConfig::new(10));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .context("Failed to create Redis pool")?;

        let mut attempts = 0;
        loop {
            let ready = match pool.get().await {
                Ok(mut conn) => {
                    deadpool_redis::redis::cmd("PING")
                        .query_async::<()>(&mut conn)
                        .await
                        .is_ok()
                }
                Err(_) => false,
            };
            if ready {
                return Ok(pool);
            }
            attempts += 1;
            if attempts >= 20 {
                anyhow::bail!("Redis not ready after {attempts} attempts");
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    pub async fn get_connection(&self) -> Result<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    pub async fn flush_db(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        deadpool_redis::redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Get a test-prefixed key for isolation
    pub fn test_key(&self, key: &str) -> String {
        format!("{}{}", self.test_prefix, key)
    }
}
