use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use event_bus::{ChannelError, Delivery, MessageChannel, MessageSource};
use redis_connection::cache::{CacheError, CacheResult, CacheTrait};

/// Cache whose every operation fails as if the server were down
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCache;

fn down() -> CacheError { CacheError::Connection("connection refused".into()) }

#[async_trait]
impl CacheTrait for UnavailableCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Bytes>> { Err(down()) }

    async fn set_with_ttl(
        &self, _key: &str, _value: Bytes, _ttl: Duration,
    ) -> CacheResult<()> {
        Err(down())
    }

    async fn remove(&self, _key: &str) -> CacheResult<bool> { Err(down()) }

    async fn keys(&self, _pattern: &str) -> CacheResult<Vec<String>> {
        Err(down())
    }
}

/// Message channel that refuses every operation
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableChannel;

fn refused() -> ChannelError {
    ChannelError::Connection("connection refused".into())
}

#[async_trait]
impl MessageChannel for UnavailableChannel {
    fn name(&self) -> &str { "unavailable" }

    async fn publish(&self, _payload: Bytes) -> Result<(), ChannelError> {
        Err(refused())
    }
}

#[async_trait]
impl MessageSource for UnavailableChannel {
    fn name(&self) -> &str { "unavailable" }

    async fn receive(&self) -> Result<Option<Delivery>, ChannelError> {
        Err(refused())
    }

    async fn ack(&self, _delivery: &Delivery) -> Result<(), ChannelError> {
        Err(refused())
    }

    async fn nack(
        &self, _delivery: &Delivery, _requeue: bool,
    ) -> Result<(), ChannelError> {
        Err(refused())
    }

    async fn dead_letter(
        &self, _delivery: &Delivery, _reason: &str,
    ) -> Result<(), ChannelError> {
        Err(refused())
    }
}
