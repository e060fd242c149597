use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    backoff::Backoff,
    channel::{ChannelError, MessageChannel},
    config::PipelineConfig,
    event::InvalidationEvent,
    metrics::{PublisherMetrics, PublisherSnapshot},
};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Publishing suspended for another {0:?} after a failure")]
    Backoff(Duration),
    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("Failed to encode invalidation event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Emits invalidation events after committed writes.
///
/// Publishing is best effort. Failures are logged and counted and never
/// surface to the caller of [`InvalidationPublisher::publish_invalidation`].
/// After a failure, publishes are skipped until the backoff window elapses,
/// except for one trial publish in the second half of each window. A trial
/// that succeeds ends the backoff.
pub struct InvalidationPublisher {
    channel: Arc<dyn MessageChannel>,
    timeout: Duration,
    backoff: Mutex<Backoff>,
    metrics: PublisherMetrics,
}

impl InvalidationPublisher {
    pub fn new(channel: Arc<dyn MessageChannel>, config: &PipelineConfig) -> Self {
        Self {
            channel,
            timeout: config.publish_timeout(),
            backoff: Mutex::new(Backoff::new(
                config.backoff_initial(),
                config.backoff_max(),
            )),
            metrics: PublisherMetrics::default(),
        }
    }

    /// Publishes one event for `keys`. Never fails.
    #[instrument(skip_all, fields(queue.name = self.channel.name(), keys = ?keys))]
    pub async fn publish_invalidation(&self, keys: Vec<String>) {
        match self.try_publish(keys).await {
            Ok(()) => debug!("Invalidation published"),
            Err(PublishError::Backoff(remaining)) => {
                warn!(
                    "Skipping invalidation, channel backoff has {:?} left",
                    remaining
                );
            }
            Err(e) => warn!("Failed to publish invalidation: {}", e),
        }
    }

    pub async fn try_publish(&self, keys: Vec<String>) -> Result<(), PublishError> {
        if let Err(remaining) = self.backoff.lock().await.try_acquire() {
            self.metrics.skipped.fetch_add(1, Ordering::Relaxed);
            return Err(PublishError::Backoff(remaining));
        }

        let payload = InvalidationEvent::invalidate(keys).to_bytes()?;

        let result =
            match tokio::time::timeout(self.timeout, self.channel.publish(payload))
                .await
            {
                Ok(published) => published.map_err(PublishError::from),
                Err(_) => Err(PublishError::Timeout(self.timeout)),
            };

        let mut backoff = self.backoff.lock().await;
        match result {
            Ok(()) => {
                if backoff.failures() > 0 {
                    info!(
                        "Channel {} recovered after {} failed publishes",
                        self.channel.name(),
                        backoff.failures()
                    );
                }
                backoff.reset();
                self.metrics.published.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                let window = backoff.record_failure();
                self.metrics.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Backing off publishes for {:?}", window);
                Err(e)
            }
        }
    }

    pub fn metrics(&self) -> PublisherSnapshot { self.metrics.snapshot() }
}
