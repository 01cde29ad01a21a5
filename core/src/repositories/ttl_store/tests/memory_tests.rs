use chrono::{Duration, Utc};

use crate::errors::ErrorKind;
use crate::repositories::ttl_store::{MemoryTtlStore, TtlStore};

#[tokio::test]
async fn test_set_and_get() {
    let store = MemoryTtlStore::new();
    store.set("blacklist:abc", "1", 60).await.unwrap();

    assert_eq!(store.get("blacklist:abc").await.unwrap().as_deref(), Some("1"));
    assert!(store.exists("blacklist:abc").await.unwrap());
    assert!(!store.exists("blacklist:other").await.unwrap());

    let ttl = store.ttl("blacklist:abc").await.unwrap().unwrap();
    assert!(ttl > 55 && ttl <= 60);
}

#[tokio::test]
async fn test_zero_ttl_is_never_visible() {
    let store = MemoryTtlStore::new();
    store.set("k", "v", 0).await.unwrap();

    assert!(!store.exists("k").await.unwrap());
    assert!(store.ttl("k").await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_expired() {
    let store = MemoryTtlStore::new();
    store.set("short", "1", 10).await.unwrap();
    store.set("long", "1", 3600).await.unwrap();

    assert_eq!(store.purge_expired_at(Utc::now()).await, 0);
    assert_eq!(store.purge_expired_at(Utc::now() + Duration::seconds(60)).await, 1);
    assert_eq!(store.len().await, 1);
    assert!(store.exists("long").await.unwrap());
}

#[tokio::test]
async fn test_failing_store() {
    let store = MemoryTtlStore::new();
    store.set_failing(true);

    assert_eq!(
        store.exists("k").await.unwrap_err().kind(),
        ErrorKind::Dependency
    );
    assert!(store.set("k", "1", 10).await.is_err());
}
