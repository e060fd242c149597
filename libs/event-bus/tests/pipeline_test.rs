use std::{collections::BTreeSet, sync::Arc, time::Duration};

use anyhow::Result;
use bytes::Bytes;
use event_bus::{
    ConsumerState, InvalidationConsumer, InvalidationPublisher, MemoryChannel,
    MessageChannel, Outcome, PipelineConfig,
};
use redis_connection::cache::{CacheJsonExt, CacheTrait, MemoryCache};
use test_utils::{RecordingRebuilder, UnavailableCache, init_test_tracing};
use tokio::sync::watch;

const TTL: Duration = Duration::from_secs(3600);

struct Pipeline {
    channel: MemoryChannel,
    cache: Arc<MemoryCache>,
    rebuilder: Arc<RecordingRebuilder>,
    publisher: InvalidationPublisher,
    consumer: Arc<InvalidationConsumer>,
}

fn config() -> PipelineConfig {
    PipelineConfig {
        max_redeliveries: Some(2),
        backoff_initial_ms: 10,
        ..Default::default()
    }
}

fn pipeline_with(rebuilder: RecordingRebuilder) -> Pipeline {
    init_test_tracing();
    let config = config();
    let channel = MemoryChannel::new("cache-invalidation")
        .with_block(Duration::from_millis(20));
    let cache = Arc::new(MemoryCache::default());
    let rebuilder = Arc::new(rebuilder);

    let publisher = InvalidationPublisher::new(Arc::new(channel.clone()), &config);
    let consumer = InvalidationConsumer::new(
        Arc::new(channel.clone()),
        cache.clone(),
        &config,
    )
    .with_rebuilder(rebuilder.clone());

    Pipeline {
        channel,
        cache,
        rebuilder,
        publisher,
        consumer: Arc::new(consumer),
    }
}

fn pipeline() -> Pipeline { pipeline_with(RecordingRebuilder::new("blogs", "blogs::")) }

async fn seed(cache: &MemoryCache, keys: &[&str]) -> Result<()> {
    for key in keys {
        cache.set_json(key, &"cached".to_string(), TTL).await?;
    }
    Ok(())
}

async fn cached_keys(cache: &MemoryCache) -> Result<BTreeSet<String>> {
    Ok(cache.keys("*").await?.into_iter().collect())
}

#[tokio::test]
async fn test_list_invalidation_deletes_views_and_rebuilds_once() -> Result<()> {
    let p = pipeline();
    let single = "blog:0190c4a0-0000-7000-8000-000000000001";
    seed(&p.cache, &["blogs::Tech", "blogs::Travel", "blogs::", single]).await?;

    p.publisher
        .publish_invalidation(vec!["blogs:*".to_string()])
        .await;
    let outcome = p.consumer.process_next().await?;

    assert_eq!(outcome, Some(Outcome::Acked {
        deleted: 3,
        rebuilt: 1
    }));
    assert_eq!(p.cache.get("blogs::Tech").await?, None);
    assert_eq!(p.cache.get("blogs::Travel").await?, None);
    assert!(p.cache.get(single).await?.is_some());
    assert_eq!(p.cache.get_json::<usize>("blogs::").await?, Some(1));
    assert_eq!(p.rebuilder.calls(), 1);
    assert_eq!(p.channel.in_flight(), 0);
    Ok(())
}

#[tokio::test]
async fn test_several_list_patterns_rebuild_once() -> Result<()> {
    let p = pipeline();
    seed(&p.cache, &["blogs::Tech", "blogs:rust:"]).await?;

    p.publisher
        .publish_invalidation(vec![
            "blogs::Tech".to_string(),
            "blogs:rust:*".to_string(),
        ])
        .await;

    assert_eq!(p.consumer.process_next().await?, Some(Outcome::Acked {
        deleted: 2,
        rebuilt: 1
    }));
    assert_eq!(p.rebuilder.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_single_blog_pattern_does_not_rebuild_lists() -> Result<()> {
    let p = pipeline();
    let key = "blog:0190c4a0-0000-7000-8000-000000000002";
    seed(&p.cache, &[key, "blogs::"]).await?;

    p.publisher.publish_invalidation(vec![key.to_string()]).await;

    assert_eq!(p.consumer.process_next().await?, Some(Outcome::Acked {
        deleted: 1,
        rebuilt: 0
    }));
    assert_eq!(p.cache.get(key).await?, None);
    assert_eq!(
        p.cache.get_json::<String>("blogs::").await?.as_deref(),
        Some("cached")
    );
    assert_eq!(p.rebuilder.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_pattern_without_matches_is_acked_without_rebuild() -> Result<()> {
    let p = pipeline();

    p.publisher
        .publish_invalidation(vec!["blogs:*".to_string()])
        .await;

    assert_eq!(p.consumer.process_next().await?, Some(Outcome::Acked {
        deleted: 0,
        rebuilt: 0
    }));
    assert_eq!(p.rebuilder.calls(), 0);
    assert!(p.channel.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_back_to_back_events_each_rebuild() -> Result<()> {
    let p = pipeline();
    seed(&p.cache, &["blogs::Tech"]).await?;

    p.publisher
        .publish_invalidation(vec!["blogs:*".to_string()])
        .await;
    p.publisher
        .publish_invalidation(vec!["blogs:*".to_string()])
        .await;

    p.consumer.process_next().await?;
    p.consumer.process_next().await?;

    // the second event deletes the view the first one rebuilt
    assert_eq!(p.rebuilder.calls(), 2);
    assert_eq!(p.cache.get_json::<usize>("blogs::").await?, Some(2));
    assert_eq!(p.consumer.metrics().acked, 2);
    Ok(())
}

#[tokio::test]
async fn test_reprocessing_converges_to_same_keys() -> Result<()> {
    let p = pipeline();
    let single = "blog:0190c4a0-0000-7000-8000-000000000003";
    seed(&p.cache, &["blogs::Tech", "blogs:go:", single]).await?;
    let patterns = || vec!["blogs:*".to_string(), single.to_string()];

    p.publisher.publish_invalidation(patterns()).await;
    p.consumer.process_next().await?;
    let once = cached_keys(&p.cache).await?;

    p.publisher.publish_invalidation(patterns()).await;
    p.consumer.process_next().await?;
    let twice = cached_keys(&p.cache).await?;

    assert_eq!(once, BTreeSet::from(["blogs::".to_string()]));
    assert_eq!(once, twice);
    Ok(())
}

#[tokio::test]
async fn test_event_order_does_not_matter() -> Result<()> {
    let a = vec!["blog:0190c4a0-0000-7000-8000-00000000000a".to_string()];
    let b = vec!["blogs:*".to_string()];
    let seeded = [
        "blogs::Tech",
        "blogs::",
        "blog:0190c4a0-0000-7000-8000-00000000000a",
        "blog:0190c4a0-0000-7000-8000-00000000000b",
    ];

    let mut finals = Vec::new();
    for order in [[&a, &b], [&b, &a]] {
        let p = pipeline();
        seed(&p.cache, &seeded).await?;
        for keys in order {
            p.publisher.publish_invalidation(keys.clone()).await;
            p.consumer.process_next().await?;
        }
        finals.push(cached_keys(&p.cache).await?);
    }

    assert_eq!(finals[0], finals[1]);
    Ok(())
}

#[tokio::test]
async fn test_malformed_and_unknown_messages_are_discarded() -> Result<()> {
    let p = pipeline();
    seed(&p.cache, &["blogs::Tech"]).await?;

    MessageChannel::publish(&p.channel, Bytes::from_static(b"not json")).await?;
    MessageChannel::publish(
        &p.channel,
        Bytes::from_static(br#"{"action":"warmCache","keys":["blogs:*"]}"#),
    )
    .await?;

    assert_eq!(p.consumer.process_next().await?, Some(Outcome::Discarded));
    assert_eq!(p.consumer.process_next().await?, Some(Outcome::Discarded));

    assert!(p.cache.get("blogs::Tech").await?.is_some());
    assert!(p.channel.is_empty());
    assert_eq!(p.channel.in_flight(), 0);
    assert_eq!(p.consumer.metrics().discarded, 2);
    Ok(())
}

#[tokio::test]
async fn test_cache_outage_requeues_then_dead_letters() -> Result<()> {
    init_test_tracing();
    let config = config();
    let channel = MemoryChannel::new("cache-invalidation")
        .with_block(Duration::from_millis(20));
    let publisher = InvalidationPublisher::new(Arc::new(channel.clone()), &config);
    let consumer = InvalidationConsumer::new(
        Arc::new(channel.clone()),
        Arc::new(UnavailableCache),
        &config,
    );

    publisher
        .publish_invalidation(vec!["blogs:*".to_string()])
        .await;

    assert_eq!(consumer.process_next().await?, Some(Outcome::Requeued));
    assert_eq!(consumer.process_next().await?, Some(Outcome::Requeued));
    assert_eq!(consumer.process_next().await?, Some(Outcome::DeadLettered));
    assert_eq!(consumer.process_next().await?, None);

    let dead = channel.dead_letters();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].delivery.attempt, 2);
    assert!(dead[0].reason.contains("blogs:*"));

    let metrics = consumer.metrics();
    assert_eq!(metrics.requeued, 2);
    assert_eq!(metrics.dead_lettered, 1);
    assert_eq!(metrics.acked, 0);
    Ok(())
}

#[tokio::test]
async fn test_failed_rebuild_is_requeued() -> Result<()> {
    let p = pipeline_with(RecordingRebuilder::new("blogs", "blogs::").failing(1));
    seed(&p.cache, &["blogs::Tech"]).await?;

    p.publisher
        .publish_invalidation(vec!["blogs:*".to_string()])
        .await;

    assert_eq!(p.consumer.process_next().await?, Some(Outcome::Requeued));
    // deletions happened before the rebuild failed
    assert_eq!(p.cache.get("blogs::Tech").await?, None);

    // nothing left to delete, the retry still rebuilds the covered view
    assert_eq!(p.consumer.process_next().await?, Some(Outcome::Acked {
        deleted: 0,
        rebuilt: 1
    }));
    assert_eq!(p.rebuilder.calls(), 2);
    assert_eq!(p.cache.get_json::<usize>("blogs::").await?, Some(2));
    assert!(p.channel.dead_letters().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unbounded_redelivery_never_dead_letters() -> Result<()> {
    init_test_tracing();
    let config = PipelineConfig {
        max_redeliveries: None,
        ..config()
    };
    let channel = MemoryChannel::new("q").with_block(Duration::from_millis(20));
    let consumer = InvalidationConsumer::new(
        Arc::new(channel.clone()),
        Arc::new(UnavailableCache),
        &config,
    );
    MessageChannel::publish(
        &channel,
        Bytes::from_static(br#"{"action":"invalidateCache","keys":["blogs:*"]}"#),
    )
    .await?;

    for _ in 0..10 {
        assert_eq!(consumer.process_next().await?, Some(Outcome::Requeued));
    }
    assert!(channel.dead_letters().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_spawned_consumer_drains_and_stops() -> Result<()> {
    let p = pipeline();
    seed(&p.cache, &["blogs::Tech"]).await?;
    let (stop, shutdown) = watch::channel(false);

    let handle = p.consumer.clone().spawn(shutdown);
    p.publisher
        .publish_invalidation(vec!["blogs:*".to_string()])
        .await;

    let mut waited = Duration::ZERO;
    while p.consumer.metrics().acked == 0 && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }

    stop.send(true)?;
    tokio::time::timeout(Duration::from_secs(5), handle).await??;

    assert_eq!(p.consumer.metrics().acked, 1);
    assert_eq!(p.cache.get("blogs::Tech").await?, None);
    assert_eq!(p.rebuilder.calls(), 1);
    assert_eq!(p.consumer.state(), ConsumerState::Idle);
    Ok(())
}

#[tokio::test]
async fn test_dropped_shutdown_sender_stops_consumer() -> Result<()> {
    let p = pipeline();
    let (stop, shutdown) = watch::channel(false);

    let handle = p.consumer.clone().spawn(shutdown);
    drop(stop);

    tokio::time::timeout(Duration::from_secs(5), handle).await??;
    Ok(())
}
