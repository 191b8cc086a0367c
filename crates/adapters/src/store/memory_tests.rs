// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fence_core::FakeClock;

const TTL: Duration = Duration::from_millis(5000);

fn store() -> (MemoryStore<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    (MemoryStore::with_clock("memory://test", clock.clone()), clock)
}

#[tokio::test]
async fn set_if_absent_writes_only_once() {
    let (store, _) = store();

    assert!(store.set_if_absent("invoice:42", "a", TTL).await.unwrap());
    assert!(!store.set_if_absent("invoice:42", "b", TTL).await.unwrap());
    assert_eq!(store.get("invoice:42").as_deref(), Some("a"));
}

#[tokio::test]
async fn expired_value_can_be_overwritten() {
    let (store, clock) = store();
    store.set_if_absent("invoice:42", "a", TTL).await.unwrap();

    clock.advance(TTL);

    assert_eq!(store.get("invoice:42"), None);
    assert!(store.set_if_absent("invoice:42", "b", TTL).await.unwrap());
    assert_eq!(store.get("invoice:42").as_deref(), Some("b"));
}

#[tokio::test]
async fn delete_requires_matching_token() {
    let (store, _) = store();
    store.set_if_absent("invoice:42", "a", TTL).await.unwrap();

    assert!(!store.delete_if_match("invoice:42", "b").await.unwrap());
    assert_eq!(store.get("invoice:42").as_deref(), Some("a"));

    assert!(store.delete_if_match("invoice:42", "a").await.unwrap());
    assert_eq!(store.get("invoice:42"), None);
}

#[tokio::test]
async fn delete_of_expired_value_reports_nothing_released() {
    let (store, clock) = store();
    store.set_if_absent("invoice:42", "a", TTL).await.unwrap();
    clock.advance(TTL + Duration::from_millis(1));

    assert!(!store.delete_if_match("invoice:42", "a").await.unwrap());
}

#[tokio::test]
async fn closed_connection_rejects_operations() {
    let (store, _) = store();
    store.close().await.unwrap();

    assert_eq!(
        store.set_if_absent("k", "v", TTL).await,
        Err(StoreError::Closed)
    );
    assert_eq!(store.delete_if_match("k", "v").await, Err(StoreError::Closed));
    assert_eq!(store.close().await, Err(StoreError::Closed));
}

#[tokio::test]
async fn reconnect_shares_keyspace_but_not_closed_flag() {
    let (store, _) = store();
    store.set_if_absent("k", "v", TTL).await.unwrap();
    store.close().await.unwrap();

    let fresh = store.reconnect();
    assert!(!fresh.is_closed());
    assert_eq!(fresh.get("k").as_deref(), Some("v"));
}

#[tokio::test]
async fn connector_shares_keyspace_per_name() {
    let connector = MemoryConnector::with_clock(FakeClock::new());
    let a1 = connector.connect("memory://a").await.unwrap();
    let a2 = connector.connect("memory://a").await.unwrap();
    let b = connector.connect("memory://b").await.unwrap();

    assert!(a1.set_if_absent("k", "first", TTL).await.unwrap());
    assert!(!a2.set_if_absent("k", "second", TTL).await.unwrap());
    assert!(b.set_if_absent("k", "other", TTL).await.unwrap());
    assert_eq!(a2.address(), "memory://a");
}

#[tokio::test]
async fn connector_rejects_foreign_addresses() {
    let connector = MemoryConnector::new();
    for address in ["redis://localhost:6379", "memory://", "a"] {
        assert_eq!(
            connector.connect(address).await.err(),
            Some(StoreError::UnsupportedAddress(address.to_string()))
        );
    }
}
