use deadpool_postgres::{Object, Pool};
pub use deadpool_postgres::PoolError;
pub use tokio_postgres::Error as PgError;

pub use config::{DbConnectConfig, DbOptionsConfig, PostgresDbConfig};
pub use connect::connect_postgres_db;

pub mod config;
mod connect;

/// Handle on the Postgres pool, cloned into every DAO
#[derive(Debug, Clone)]
pub struct SqlConnect {
    pool: Pool,
}

impl SqlConnect {
    pub fn new(pool: Pool) -> Self { Self { pool } }

    pub async fn get_client(&self) -> Result<Object, PoolError> {
        self.pool.get().await
    }

    /// Available and total connections, for monitoring
    pub fn get_pool_status(&self) -> (usize, usize) {
        let status = self.pool.status();
        (status.available, status.size)
    }
}
