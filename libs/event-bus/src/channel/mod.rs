use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

pub mod memory;
pub mod redis_stream;

pub use memory::{DeadLetter, MemoryChannel};
pub use redis_stream::RedisStreamChannel;

/// One message handed to a consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Channel-assigned identifier, used to ack or nack
    pub id: String,
    pub payload: Bytes,
    /// 0 on the first delivery, incremented on every requeue
    pub attempt: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel unreachable: {0}")]
    Connection(String),
    #[error("Channel backend error: {0}")]
    Backend(String),
    #[error("Channel operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Channel closed")]
    Closed,
}

/// Producer side of the invalidation queue
#[async_trait]
pub trait MessageChannel: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, payload: Bytes) -> Result<(), ChannelError>;
}

/// Consumer side of the invalidation queue. Every delivery returned by
/// [`MessageSource::receive`] must be settled exactly once with `ack`,
/// `nack` or `dead_letter`.
#[async_trait]
pub trait MessageSource: Send + Sync {
    fn name(&self) -> &str;

    /// Declares the queue and registers the consumer. Idempotent.
    async fn prepare(&self) -> Result<(), ChannelError> { Ok(()) }

    /// Waits a bounded time for the next delivery
    async fn receive(&self) -> Result<Option<Delivery>, ChannelError>;

    async fn ack(&self, delivery: &Delivery) -> Result<(), ChannelError>;

    /// Negative acknowledgement. With `requeue` the message is delivered
    /// again with its attempt number incremented, otherwise it is dropped.
    async fn nack(
        &self, delivery: &Delivery, requeue: bool,
    ) -> Result<(), ChannelError>;

    /// Settles the delivery by parking it in the dead-letter sink
    async fn dead_letter(
        &self, delivery: &Delivery, reason: &str,
    ) -> Result<(), ChannelError>;
}
