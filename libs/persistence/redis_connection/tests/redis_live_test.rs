//! Tests against a live Redis on `localhost:6380`.
//! Run with `cargo test -p redis-connection -- --ignored`.

use std::time::Duration;

use bytes::Bytes;
use redis_connection::{
    cache::{CacheTrait, RedisCache},
    config::RedisDbConfig,
    connect_redis_db,
    connection::RedisConnectionManager,
    types::Stream,
};
use uuid::Uuid;

async fn setup_test_redis() -> anyhow::Result<RedisConnectionManager> {
    let config = RedisDbConfig {
        host: "localhost".to_string(),
        port: 6380,
        ..Default::default()
    };
    let pool = connect_redis_db(&config).await?;
    let manager = RedisConnectionManager::new(pool);
    manager.ping().await?;
    Ok(manager)
}

fn unique(prefix: &str) -> String { format!("{prefix}-{}", Uuid::now_v7()) }

#[tokio::test]
#[ignore = "requires redis on localhost:6380"]
async fn test_cache_set_get_remove() {
    let manager = setup_test_redis().await.unwrap();
    let cache = RedisCache::new(manager.pool().clone());
    let key = unique("test:cache");

    cache
        .set_with_ttl(&key, Bytes::from_static(b"payload"), Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(
        cache.get(&key).await.unwrap(),
        Some(Bytes::from_static(b"payload"))
    );
    assert!(cache.remove(&key).await.unwrap());
    assert!(!cache.remove(&key).await.unwrap());
    assert_eq!(cache.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires redis on localhost:6380"]
async fn test_cache_keys_by_pattern() {
    let manager = setup_test_redis().await.unwrap();
    let cache = RedisCache::new(manager.pool().clone());
    let ns = unique("test-ns");
    let ttl = Duration::from_secs(60);

    for key in [format!("{ns}:a"), format!("{ns}:b"), format!("{ns}x:c")] {
        cache.set_with_ttl(&key, Bytes::from_static(b"1"), ttl).await.unwrap();
    }

    let keys = cache.keys(&format!("{ns}:*")).await.unwrap();
    assert_eq!(keys, vec![format!("{ns}:a"), format!("{ns}:b")]);

    let removed = cache.remove_many(&keys).await.unwrap();
    assert_eq!(removed, 2);
    assert!(cache.keys(&format!("{ns}:*")).await.unwrap().is_empty());

    cache.remove(&format!("{ns}x:c")).await.unwrap();
}

#[tokio::test]
#[ignore = "requires redis on localhost:6380"]
async fn test_stream_group_read_ack() {
    let manager = setup_test_redis().await.unwrap();
    let stream = Stream::new(manager.pool().clone(), unique("test:stream"));

    assert!(stream.create_group_mkstream("workers", "$").await.unwrap());
    assert!(!stream.create_group_mkstream("workers", "$").await.unwrap());

    stream.add(&[("payload", b"first".as_slice())]).await.unwrap();

    let entries = stream
        .read_group("workers", "w1", ">", 1, Some(Duration::from_millis(100)))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);

    let pending = stream.pending("workers").await.unwrap();
    assert_eq!(pending.count(), 1);

    let acked = stream.ack("workers", &[entries[0].id.as_str()]).await.unwrap();
    assert_eq!(acked, 1);

    let empty = stream
        .read_group("workers", "w1", ">", 1, Some(Duration::from_millis(50)))
        .await
        .unwrap();
    assert!(empty.is_empty());

    stream.delete_group("workers").await.unwrap();
}

#[tokio::test]
#[ignore = "requires redis on localhost:6380"]
async fn test_stream_requeue_moves_entry_to_tail() {
    let manager = setup_test_redis().await.unwrap();
    let stream = Stream::new(manager.pool().clone(), unique("test:stream"));
    stream.create_group_mkstream("workers", "0").await.unwrap();

    stream.add(&[("payload", b"job".as_slice())]).await.unwrap();
    let first = stream
        .read_group("workers", "w1", ">", 1, None)
        .await
        .unwrap();

    let new_id = stream
        .requeue("workers", &first[0].id, &[("payload", b"job".as_slice())])
        .await
        .unwrap();
    assert_ne!(new_id, first[0].id);

    // the original is acknowledged, only the copy is pending delivery
    let own_pending = stream
        .read_group("workers", "w1", "0", 10, None)
        .await
        .unwrap();
    assert!(own_pending.is_empty());

    let again = stream
        .read_group("workers", "w1", ">", 1, None)
        .await
        .unwrap();
    assert_eq!(again[0].id, new_id);
    assert_eq!(stream.len().await.unwrap(), 2);

    stream.delete_group("workers").await.unwrap();
}
