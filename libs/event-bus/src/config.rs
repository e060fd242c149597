use std::time::Duration;

/// Settings shared by the invalidation publisher and consumer.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "queue_name_default")]
    pub queue_name: String,
    #[serde(default = "consumer_group_default")]
    pub consumer_group: String,
    #[serde(default = "consumer_name_default")]
    pub consumer_name: String,
    #[serde(default = "cache_ttl_secs_default")]
    pub cache_ttl_secs: u64,
    #[serde(default = "publish_timeout_ms_default")]
    pub publish_timeout_ms: u64,
    #[serde(default = "backoff_initial_ms_default")]
    pub backoff_initial_ms: u64,
    #[serde(default = "backoff_max_ms_default")]
    pub backoff_max_ms: u64,
    /// `None` requeues failing messages forever
    #[serde(default = "max_redeliveries_default")]
    pub max_redeliveries: Option<u32>,
    /// Upper bound of one blocking read. Kept short; the consumer loop
    /// simply reads again.
    #[serde(default = "read_block_ms_default")]
    pub read_block_ms: u64,
    /// Approximate cap on the stream length, trimmed on publish
    #[serde(default = "max_len_default")]
    pub max_len: usize,
    /// Entries left pending by another consumer this long are claimed and
    /// delivered again; `None` never claims
    #[serde(default = "claim_idle_ms_default")]
    pub claim_idle_ms: Option<u64>,
}

impl PipelineConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    pub fn read_block(&self) -> Duration {
        Duration::from_millis(self.read_block_ms)
    }

    pub fn claim_idle(&self) -> Option<Duration> {
        self.claim_idle_ms.map(Duration::from_millis)
    }

    pub fn dead_letter_queue(&self) -> String {
        format!("{}:dead-letter", self.queue_name)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_name: queue_name_default(),
            consumer_group: consumer_group_default(),
            consumer_name: consumer_name_default(),
            cache_ttl_secs: cache_ttl_secs_default(),
            publish_timeout_ms: publish_timeout_ms_default(),
            backoff_initial_ms: backoff_initial_ms_default(),
            backoff_max_ms: backoff_max_ms_default(),
            max_redeliveries: max_redeliveries_default(),
            read_block_ms: read_block_ms_default(),
            max_len: max_len_default(),
            claim_idle_ms: claim_idle_ms_default(),
        }
    }
}

fn queue_name_default() -> String { "cache-invalidation".into() }
fn consumer_group_default() -> String { "blog-service".into() }
fn consumer_name_default() -> String { "blog-service-1".into() }
fn cache_ttl_secs_default() -> u64 { 3600 }
fn publish_timeout_ms_default() -> u64 { 2_000 }
fn backoff_initial_ms_default() -> u64 { 500 }
fn backoff_max_ms_default() -> u64 { 30_000 }
fn max_redeliveries_default() -> Option<u32> { Some(5) }
fn read_block_ms_default() -> u64 { 250 }
fn max_len_default() -> usize { 10_000 }
fn claim_idle_ms_default() -> Option<u64> { Some(30_000) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.queue_name, "cache-invalidation");
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.max_redeliveries, Some(5));
        assert_eq!(config.dead_letter_queue(), "cache-invalidation:dead-letter");
        assert_eq!(config.claim_idle(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_claiming_disabled() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"claim_idle_ms": null}"#).unwrap();

        assert_eq!(config.claim_idle(), None);
    }

    #[test]
    fn test_unbounded_redelivery() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"max_redeliveries": null}"#).unwrap();

        assert_eq!(config.max_redeliveries, None);
    }
}
