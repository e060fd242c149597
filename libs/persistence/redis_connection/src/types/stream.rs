use std::{borrow::Cow, time::Duration};

use deadpool_redis::{
    Connection, Pool,
    redis::{
        self, AsyncCommands, ErrorKind, RedisError, RedisResult,
        streams::{
            StreamAutoClaimOptions, StreamAutoClaimReply, StreamId,
            StreamMaxlen, StreamPendingReply, StreamRangeReply,
            StreamReadOptions, StreamReadReply,
        },
    },
};

/// Handle on one Redis stream, used as a durable work queue through
/// consumer groups. Field values are raw bytes; callers own the encoding.
#[derive(Clone)]
pub struct Stream {
    pool: Pool,
    key: Cow<'static, str>,
}

impl Stream {
    pub fn new(pool: Pool, key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            pool,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str { &self.key }

    async fn connection(&self) -> RedisResult<Connection> {
        self.pool.get().await.map_err(|e| {
            RedisError::from((
                ErrorKind::IoError,
                "Pool connection error",
                e.to_string(),
            ))
        })
    }

    /// Add entry to stream with auto-generated ID
    pub async fn add(&self, fields: &[(&str, &[u8])]) -> RedisResult<String> {
        let mut conn = self.connection().await?;
        conn.xadd(&*self.key, "*", fields).await
    }

    /// Add entry, trimming the stream to roughly `max_len` entries
    pub async fn add_capped(
        &self, max_len: usize, fields: &[(&str, &[u8])],
    ) -> RedisResult<String> {
        let mut conn = self.connection().await?;
        conn.xadd_maxlen(&*self.key, StreamMaxlen::Approx(max_len), "*", fields)
            .await
    }

    /// Get length of stream
    pub async fn len(&self) -> RedisResult<usize> {
        let mut conn = self.connection().await?;
        conn.xlen(&*self.key).await
    }

    /// Create consumer group with MKSTREAM. Returns false when the group
    /// already existed.
    pub async fn create_group_mkstream(
        &self, group: &str, id: &str,
    ) -> RedisResult<bool> {
        let mut conn = self.connection().await?;
        let created: RedisResult<()> =
            conn.xgroup_create_mkstream(&*self.key, group, id).await;
        match created {
            Ok(()) => Ok(true),
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read from consumer group. `id` is `>` for new entries or `0` for
    /// entries already delivered to this consumer and not yet acknowledged.
    pub async fn read_group(
        &self, group: &str, consumer: &str, id: &str, count: usize,
        block: Option<Duration>,
    ) -> RedisResult<Vec<StreamId>> {
        let mut conn = self.connection().await?;
        let mut opts = StreamReadOptions::default()
            .count(count)
            .group(group, consumer);
        if let Some(block) = block {
            opts = opts.block(block.as_millis() as usize);
        }

        let reply: Option<StreamReadReply> =
            conn.xread_options(&[&*self.key], &[id], &opts).await?;

        Ok(reply
            .map(|reply| {
                reply
                    .keys
                    .into_iter()
                    .flat_map(|stream| stream.ids)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Take over entries another consumer left pending for at least
    /// `min_idle`, scanning the pending list from `start`. Returns the
    /// claimed entries and the cursor for the next scan, `0-0` once the
    /// whole list has been walked.
    pub async fn autoclaim(
        &self, group: &str, consumer: &str, min_idle: Duration, start: &str,
        count: usize,
    ) -> RedisResult<(String, Vec<StreamId>)> {
        let mut conn = self.connection().await?;
        let reply: StreamAutoClaimReply = conn
            .xautoclaim_options(
                &*self.key,
                group,
                consumer,
                min_idle.as_millis() as u64,
                start,
                StreamAutoClaimOptions::default().count(count),
            )
            .await?;

        Ok((reply.next_stream_id, reply.claimed))
    }

    /// Acknowledge message processing
    pub async fn ack(&self, group: &str, ids: &[&str]) -> RedisResult<u64> {
        let mut conn = self.connection().await?;
        conn.xack(&*self.key, group, ids).await
    }

    /// Re-append an entry at the tail and acknowledge the original in one
    /// `MULTI`, so the entry is never lost nor duplicated. Returns the id of
    /// the new entry.
    pub async fn requeue(
        &self, group: &str, id: &str, fields: &[(&str, &[u8])],
    ) -> RedisResult<String> {
        let mut conn = self.connection().await?;
        let (new_id, _acked): (String, u64) = redis::pipe()
            .atomic()
            .xadd(&*self.key, "*", fields)
            .xack(&*self.key, group, &[id])
            .query_async(&mut conn)
            .await?;
        Ok(new_id)
    }

    /// Acknowledge an entry on this stream and append a copy to another
    /// stream atomically.
    pub async fn move_to(
        &self, target: &str, group: &str, id: &str, fields: &[(&str, &[u8])],
    ) -> RedisResult<String> {
        let mut conn = self.connection().await?;
        let (new_id, _acked): (String, u64) = redis::pipe()
            .atomic()
            .xadd(target, "*", fields)
            .xack(&*self.key, group, &[id])
            .query_async(&mut conn)
            .await?;
        Ok(new_id)
    }

    /// Get pending messages info
    pub async fn pending(&self, group: &str) -> RedisResult<StreamPendingReply> {
        let mut conn = self.connection().await?;
        conn.xpending(&*self.key, group).await
    }

    /// Read entries from stream by range
    pub async fn range(
        &self, start: &str, end: &str,
    ) -> RedisResult<StreamRangeReply> {
        let mut conn = self.connection().await?;
        conn.xrange(&*self.key, start, end).await
    }

    /// Delete consumer group
    pub async fn delete_group(&self, group: &str) -> RedisResult<()> {
        let mut conn = self.connection().await?;
        conn.xgroup_destroy(&*self.key, group).await
    }
}
