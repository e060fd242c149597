use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use redis_connection::{
    Pool, RedisError,
    redis::streams::StreamId,
    types::Stream,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{ChannelError, Delivery, MessageChannel, MessageSource};
use crate::config::PipelineConfig;

const PAYLOAD_FIELD: &str = "payload";
const ATTEMPT_FIELD: &str = "attempt";
const REASON_FIELD: &str = "reason";
const SOURCE_ID_FIELD: &str = "source_id";
const CURSOR_START: &str = "0-0";

/// Durable queue on a Redis stream read through a consumer group.
///
/// Entries carry `payload` and `attempt` fields. A requeue appends a copy
/// with the attempt incremented and acknowledges the original in the same
/// transaction. On startup, and again after any failed command, the
/// consumer first re-reads its own pending entries, so messages left
/// unacknowledged by a crash or a lost ack are delivered again. Entries
/// another consumer left pending past `claim_idle` are claimed and
/// delivered here.
pub struct RedisStreamChannel {
    stream: Stream,
    dead_letter: String,
    group: String,
    consumer: String,
    block: Duration,
    max_len: usize,
    claim_idle: Option<Duration>,
    claim_cursor: Mutex<String>,
    draining_pending: AtomicBool,
}

impl RedisStreamChannel {
    pub fn new(pool: Pool, config: &PipelineConfig) -> Self {
        Self {
            stream: Stream::new(pool, config.queue_name.clone()),
            dead_letter: config.dead_letter_queue(),
            group: config.consumer_group.clone(),
            consumer: config.consumer_name.clone(),
            block: config.read_block(),
            max_len: config.max_len,
            claim_idle: config.claim_idle(),
            claim_cursor: Mutex::new(CURSOR_START.to_string()),
            draining_pending: AtomicBool::new(true),
        }
    }

    pub fn stream(&self) -> &Stream { &self.stream }

    pub fn dead_letter_queue(&self) -> &str { &self.dead_letter }

    /// Maps a failed command and replays our pending list on the next read
    fn failed(&self, e: RedisError) -> ChannelError {
        self.draining_pending.store(true, Ordering::Relaxed);
        channel_error(e)
    }

    async fn read_pending(&self) -> Result<Option<StreamId>, RedisError> {
        let pending = self
            .stream
            .read_group(&self.group, &self.consumer, "0", 1, None)
            .await?;
        Ok(pending.into_iter().next())
    }

    async fn claim_next_idle(&self) -> Result<Option<StreamId>, RedisError> {
        let Some(min_idle) = self.claim_idle
        else {
            return Ok(None);
        };

        let mut cursor = self.claim_cursor.lock().await;
        let (next, claimed) = self
            .stream
            .autoclaim(&self.group, &self.consumer, min_idle, &cursor, 1)
            .await?;
        *cursor = next;
        Ok(claimed.into_iter().next())
    }

    fn to_delivery(entry: StreamId) -> Delivery {
        // fields trimmed away by MAXLEN come back empty and fail to parse
        let payload = entry
            .get::<Vec<u8>>(PAYLOAD_FIELD)
            .map(Bytes::from)
            .unwrap_or_default();
        let attempt = entry.get::<u32>(ATTEMPT_FIELD).unwrap_or(0);

        Delivery {
            id: entry.id,
            payload,
            attempt,
        }
    }
}

fn channel_error(e: RedisError) -> ChannelError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
        ChannelError::Connection(e.to_string())
    }
    else {
        ChannelError::Backend(e.to_string())
    }
}

#[async_trait]
impl MessageChannel for RedisStreamChannel {
    fn name(&self) -> &str { self.stream.key() }

    async fn publish(&self, payload: Bytes) -> Result<(), ChannelError> {
        let id = self
            .stream
            .add_capped(
                self.max_len,
                &[(PAYLOAD_FIELD, &payload[..]), (ATTEMPT_FIELD, &b"0"[..])],
            )
            .await
            .map_err(channel_error)?;

        debug!(delivery.id = %id, "Published to {}", self.stream.key());
        Ok(())
    }
}

#[async_trait]
impl MessageSource for RedisStreamChannel {
    fn name(&self) -> &str { self.stream.key() }

    #[instrument(skip(self), fields(queue.name = self.stream.key()))]
    async fn prepare(&self) -> Result<(), ChannelError> {
        let created = self
            .stream
            .create_group_mkstream(&self.group, "0")
            .await
            .map_err(channel_error)?;

        if created {
            info!("Created consumer group {}", self.group);
        }
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Delivery>, ChannelError> {
        if self.draining_pending.load(Ordering::Relaxed) {
            match self.read_pending().await.map_err(|e| self.failed(e))? {
                Some(entry) => {
                    debug!(delivery.id = %entry.id, "Redelivering pending entry");
                    return Ok(Some(Self::to_delivery(entry)));
                }
                None => self.draining_pending.store(false, Ordering::Relaxed),
            }
        }

        let claimed = self.claim_next_idle().await.map_err(|e| self.failed(e))?;
        if let Some(entry) = claimed {
            warn!(delivery.id = %entry.id, "Claimed entry idle in another consumer");
            return Ok(Some(Self::to_delivery(entry)));
        }

        let entries = self
            .stream
            .read_group(&self.group, &self.consumer, ">", 1, Some(self.block))
            .await
            .map_err(|e| self.failed(e))?;

        Ok(entries.into_iter().next().map(Self::to_delivery))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), ChannelError> {
        self.stream
            .ack(&self.group, &[delivery.id.as_str()])
            .await
            .map_err(|e| self.failed(e))?;
        Ok(())
    }

    async fn nack(
        &self, delivery: &Delivery, requeue: bool,
    ) -> Result<(), ChannelError> {
        if !requeue {
            return self.ack(delivery).await;
        }

        let attempt = (delivery.attempt + 1).to_string();
        self.stream
            .requeue(&self.group, &delivery.id, &[
                (PAYLOAD_FIELD, &delivery.payload[..]),
                (ATTEMPT_FIELD, attempt.as_bytes()),
            ])
            .await
            .map_err(|e| self.failed(e))?;
        Ok(())
    }

    async fn dead_letter(
        &self, delivery: &Delivery, reason: &str,
    ) -> Result<(), ChannelError> {
        let attempt = delivery.attempt.to_string();
        self.stream
            .move_to(&self.dead_letter, &self.group, &delivery.id, &[
                (PAYLOAD_FIELD, &delivery.payload[..]),
                (ATTEMPT_FIELD, attempt.as_bytes()),
                (REASON_FIELD, reason.as_bytes()),
                (SOURCE_ID_FIELD, delivery.id.as_bytes()),
            ])
            .await
            .map_err(|e| self.failed(e))?;
        Ok(())
    }
}
