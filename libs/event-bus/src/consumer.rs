use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use redis_connection::cache::{CacheError, CacheTrait};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    channel::{ChannelError, Delivery, MessageSource},
    config::PipelineConfig,
    event::{Action, InvalidationEvent},
    metrics::{ConsumerMetrics, ConsumerSnapshot},
};

pub type RebuildError = Box<dyn std::error::Error + Send + Sync>;

/// A cached view that is recomputed from the store after its keys were
/// invalidated.
#[async_trait]
pub trait ViewRebuilder: Send + Sync {
    fn name(&self) -> &str;

    /// Whether deleting keys matched by `pattern` makes this view stale
    fn covers(&self, pattern: &str) -> bool;

    async fn rebuild(
        &self, cache: &dyn CacheTrait, ttl: Duration,
    ) -> Result<(), RebuildError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    #[error("Failed to invalidate keys matching {pattern}: {source}")]
    Invalidate {
        pattern: String,
        #[source]
        source: CacheError,
    },
    #[error("Failed to rebuild view {view}: {source}")]
    Rebuild {
        view: String,
        #[source]
        source: RebuildError,
    },
    #[error("Failed to settle delivery: {0}")]
    Channel(#[from] ChannelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Idle,
    Processing,
}

/// How a delivery was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Acked { deleted: u64, rebuilt: usize },
    /// Malformed or not an invalidation; acked without effect
    Discarded,
    Requeued,
    DeadLettered,
}

enum Applied {
    Done { deleted: u64, rebuilt: usize },
    Discarded,
}

/// Receives invalidation events, deletes the matching cache entries and
/// rebuilds the views they covered. One message is processed at a time.
pub struct InvalidationConsumer {
    source: Arc<dyn MessageSource>,
    cache: Arc<dyn CacheTrait>,
    rebuilders: Vec<Arc<dyn ViewRebuilder>>,
    ttl: Duration,
    max_redeliveries: Option<u32>,
    retry_delay: Duration,
    state: watch::Sender<ConsumerState>,
    metrics: ConsumerMetrics,
}

impl InvalidationConsumer {
    pub fn new(
        source: Arc<dyn MessageSource>, cache: Arc<dyn CacheTrait>,
        config: &PipelineConfig,
    ) -> Self {
        let (state, _) = watch::channel(ConsumerState::Idle);

        Self {
            source,
            cache,
            rebuilders: Vec::new(),
            ttl: config.cache_ttl(),
            max_redeliveries: config.max_redeliveries,
            retry_delay: config.backoff_initial(),
            state,
            metrics: ConsumerMetrics::default(),
        }
    }

    pub fn with_rebuilder(mut self, rebuilder: Arc<dyn ViewRebuilder>) -> Self {
        self.rebuilders.push(rebuilder);
        self
    }

    pub fn state(&self) -> ConsumerState { *self.state.borrow() }

    pub fn metrics(&self) -> ConsumerSnapshot { self.metrics.snapshot() }

    /// Receives and settles at most one delivery
    pub async fn process_next(&self) -> Result<Option<Outcome>, ConsumerError> {
        match self.source.receive().await? {
            Some(delivery) => self.handle(delivery).await.map(Some),
            None => Ok(None),
        }
    }

    /// Processes one delivery and settles it with the channel
    #[instrument(skip_all, fields(
        queue.name = self.source.name(),
        delivery.id = %delivery.id,
        delivery.attempt = delivery.attempt,
    ))]
    pub async fn handle(&self, delivery: Delivery) -> Result<Outcome, ConsumerError> {
        self.state.send_replace(ConsumerState::Processing);
        ConsumerMetrics::incr(&self.metrics.received);

        let outcome = self.settle(&delivery).await;

        self.state.send_replace(ConsumerState::Idle);
        if outcome.is_err() {
            ConsumerMetrics::incr(&self.metrics.errors);
        }
        outcome
    }

    async fn settle(&self, delivery: &Delivery) -> Result<Outcome, ConsumerError> {
        match self.apply(delivery).await {
            Ok(Applied::Discarded) => {
                self.source.ack(delivery).await?;
                ConsumerMetrics::incr(&self.metrics.discarded);
                Ok(Outcome::Discarded)
            }
            Ok(Applied::Done { deleted, rebuilt }) => {
                self.source.ack(delivery).await?;
                ConsumerMetrics::incr(&self.metrics.acked);
                debug!(
                    "Invalidation applied: {} keys deleted, {} views rebuilt",
                    deleted, rebuilt
                );
                Ok(Outcome::Acked { deleted, rebuilt })
            }
            Err(e) => {
                ConsumerMetrics::incr(&self.metrics.errors);

                if self
                    .max_redeliveries
                    .is_some_and(|max| delivery.attempt >= max)
                {
                    error!(
                        "Giving up on delivery after {} attempts: {}",
                        delivery.attempt + 1,
                        e
                    );
                    self.source.dead_letter(delivery, &e.to_string()).await?;
                    ConsumerMetrics::incr(&self.metrics.dead_lettered);
                    Ok(Outcome::DeadLettered)
                }
                else {
                    warn!("Invalidation failed, requeueing: {}", e);
                    self.source.nack(delivery, true).await?;
                    ConsumerMetrics::incr(&self.metrics.requeued);
                    Ok(Outcome::Requeued)
                }
            }
        }
    }

    async fn apply(&self, delivery: &Delivery) -> Result<Applied, ConsumerError> {
        let event = match InvalidationEvent::from_bytes(&delivery.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("Discarding malformed invalidation message: {}", e);
                return Ok(Applied::Discarded);
            }
        };

        if event.action != Action::InvalidateCache {
            warn!("Discarding message with unsupported action");
            return Ok(Applied::Discarded);
        }

        let mut stale = vec![false; self.rebuilders.len()];
        let mut deleted = 0;

        for pattern in &event.keys {
            let keys = self.cache.keys(pattern).await.map_err(|source| {
                ConsumerError::Invalidate {
                    pattern: pattern.clone(),
                    source,
                }
            })?;

            if keys.is_empty() {
                debug!("No cached keys match {}", pattern);
            }
            else {
                let removed =
                    self.cache.remove_many(&keys).await.map_err(|source| {
                        ConsumerError::Invalidate {
                            pattern: pattern.clone(),
                            source,
                        }
                    })?;
                deleted += removed;
                self.metrics
                    .keys_deleted
                    .fetch_add(removed, std::sync::atomic::Ordering::Relaxed);
                debug!("Deleted {} keys matching {}", removed, pattern);
            }

            // a requeued message may have deleted its keys before a rebuild failed
            if keys.is_empty() && delivery.attempt == 0 {
                continue;
            }
            for (flag, rebuilder) in stale.iter_mut().zip(&self.rebuilders) {
                *flag |= rebuilder.covers(pattern);
            }
        }

        let mut rebuilt = 0;
        for (_, rebuilder) in stale
            .iter()
            .zip(&self.rebuilders)
            .filter(|(flag, _)| **flag)
        {
            rebuilder
                .rebuild(self.cache.as_ref(), self.ttl)
                .await
                .map_err(|source| {
                    ConsumerError::Rebuild {
                        view: rebuilder.name().to_string(),
                        source,
                    }
                })?;
            ConsumerMetrics::incr(&self.metrics.rebuilds);
            info!("Rebuilt view {}", rebuilder.name());
            rebuilt += 1;
        }

        Ok(Applied::Done { deleted, rebuilt })
    }

    /// Consumes until `shutdown` flips to true or its sender is dropped.
    /// A delivery already received is settled before returning.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(queue.name = self.source.name(), "Invalidation consumer starting");

        while let Err(e) = self.source.prepare().await {
            warn!("Failed to prepare channel, retrying: {}", e);
            if self.pause(&mut shutdown).await {
                return;
            }
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            let received = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                received = self.source.receive() => received,
            };

            match received {
                Ok(Some(delivery)) => {
                    if let Err(e) = self.handle(delivery).await {
                        error!("Failed to settle delivery: {}", e);
                        if self.pause(&mut shutdown).await {
                            break;
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    ConsumerMetrics::incr(&self.metrics.errors);
                    warn!("Failed to receive from channel: {}", e);
                    if self.pause(&mut shutdown).await {
                        break;
                    }
                }
            }
        }

        info!("Invalidation consumer stopped");
    }

    /// Sleeps for the retry delay; true when shutdown was requested meanwhile
    async fn pause(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = shutdown.changed() => true,
            _ = tokio::time::sleep(self.retry_delay) => *shutdown.borrow(),
        }
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
