use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters for the publishing side
#[derive(Default)]
pub struct PublisherMetrics {
    pub published: AtomicU64,
    pub failed: AtomicU64,
    /// Publishes dropped while the backoff window was open
    pub skipped: AtomicU64,
}

impl PublisherMetrics {
    pub fn snapshot(&self) -> PublisherSnapshot {
        PublisherSnapshot {
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherSnapshot {
    pub published: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Counters for the consuming side
#[derive(Default)]
pub struct ConsumerMetrics {
    pub received: AtomicU64,
    pub acked: AtomicU64,
    pub discarded: AtomicU64,
    pub requeued: AtomicU64,
    pub dead_lettered: AtomicU64,
    pub keys_deleted: AtomicU64,
    pub rebuilds: AtomicU64,
    pub errors: AtomicU64,
}

impl ConsumerMetrics {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConsumerSnapshot {
        ConsumerSnapshot {
            received: self.received.load(Ordering::Relaxed),
            acked: self.acked.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            keys_deleted: self.keys_deleted.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerSnapshot {
    pub received: u64,
    pub acked: u64,
    pub discarded: u64,
    pub requeued: u64,
    pub dead_lettered: u64,
    pub keys_deleted: u64,
    pub rebuilds: u64,
    pub errors: u64,
}
