use std::{
    sync::atomic::{AtomicU32, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use event_bus::{RebuildError, ViewRebuilder};
use redis_connection::{
    cache::{CacheJsonExt, CacheTrait},
    core::pattern::namespace,
};

/// View rebuilder that records its runs and writes a marker entry.
/// It can be told to fail a number of times first.
pub struct RecordingRebuilder {
    namespace: String,
    key: String,
    calls: AtomicUsize,
    failures_left: AtomicU32,
}

impl RecordingRebuilder {
    /// Covers patterns in `namespace`; stores its marker under `key`
    pub fn new(namespace: &str, key: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            calls: AtomicUsize::new(0),
            failures_left: AtomicU32::new(0),
        }
    }

    pub fn failing(self, times: u32) -> Self {
        self.failures_left.store(times, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    pub fn key(&self) -> &str { &self.key }
}

#[async_trait]
impl ViewRebuilder for RecordingRebuilder {
    fn name(&self) -> &str { "recording" }

    fn covers(&self, pattern: &str) -> bool { namespace(pattern) == self.namespace }

    async fn rebuild(
        &self, cache: &dyn CacheTrait, ttl: Duration,
    ) -> Result<(), RebuildError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err("store unavailable".into());
        }

        cache.set_json(&self.key, &call, ttl).await?;
        Ok(())
    }
}
