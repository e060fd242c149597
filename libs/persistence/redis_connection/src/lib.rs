use deadpool_redis::{Config, CreatePoolError, PoolConfig, Runtime, Timeouts};
pub use deadpool_redis::{Pool, PoolError, redis, redis::RedisError};
use tracing::{info, instrument};
use url::Url;

pub mod cache;
pub mod config;
pub mod connection;
pub mod core;
pub mod macros;
pub mod types;

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Invalid Redis url: {0}")]
    Url(#[from] url::ParseError),
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(#[from] CreatePoolError),
}

/// Builds the `redis://` url for a connection config. The password, when
/// present, is carried in the userinfo section.
pub fn redis_url<C>(config: &C) -> Result<Url, url::ParseError>
where
    C: config::DbConnectConfig,
{
    let mut url = Url::parse(&format!(
        "redis://{}:{}/{}",
        config.host(),
        config.port(),
        config.db()
    ))?;

    if let Some(password) = config.password() {
        // only fails for cannot-be-a-base urls, which redis:// never is
        let _ = url.set_password(Some(password));
    }

    Ok(url)
}

#[instrument(skip_all, name = "connect-redis")]
pub async fn connect_redis_db<C>(config: &C) -> Result<Pool, ConnectError>
where
    C: config::DbConnectConfig,
{
    let url = redis_url(config)?;
    let timeout = config.connect_timeout();

    info!(
        redis.host = config.host(),
        redis.port = config.port(),
        redis.db = config.db(),
        redis.max_conn = config.max_conn(),
        redis.connect_timeout_ms = timeout.as_millis() as u64,
        redis.connect = true
    );

    let mut pool = PoolConfig::new(config.max_conn());
    pool.timeouts = Timeouts {
        wait: Some(timeout),
        create: Some(timeout),
        recycle: Some(timeout),
    };

    let cfg = Config {
        url: Some(url.to_string()),
        pool: Some(pool),
        connection: None,
    };

    let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
    Ok(pool)
}
