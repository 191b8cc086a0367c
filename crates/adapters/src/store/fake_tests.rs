// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const TTL: Duration = Duration::from_millis(5000);

#[tokio::test]
async fn fake_store_records_calls() {
    let store = FakeStore::new("memory://a", FakeClock::new());

    assert!(store.set_if_absent("invoice:42", "t1", TTL).await.unwrap());
    assert!(store.delete_if_match("invoice:42", "t1").await.unwrap());
    store.close().await.unwrap();

    assert_eq!(
        store.calls(),
        vec![
            StoreCall::Set {
                key: "invoice:42".to_string(),
                value: "t1".to_string(),
                ttl: TTL,
            },
            StoreCall::Delete {
                key: "invoice:42".to_string(),
                value: "t1".to_string(),
            },
            StoreCall::Close,
        ]
    );
    assert_eq!(store.close_count(), 1);
}

#[tokio::test]
async fn offline_store_fails_every_operation() {
    let store = FakeStore::new("memory://a", FakeClock::new());
    store.set_offline(true);

    assert!(matches!(
        store.set_if_absent("k", "v", TTL).await,
        Err(StoreError::Connection(_))
    ));
    assert!(matches!(
        store.delete_if_match("k", "v").await,
        Err(StoreError::Connection(_))
    ));

    store.set_offline(false);
    assert!(store.set_if_absent("k", "v", TTL).await.unwrap());
}

#[tokio::test]
async fn failing_deletes_leave_sets_working() {
    let store = FakeStore::new("memory://a", FakeClock::new());
    store.fail_deletes(true);

    assert!(store.set_if_absent("k", "v", TTL).await.unwrap());
    assert!(store.delete_if_match("k", "v").await.is_err());
    assert_eq!(store.holder("k").as_deref(), Some("v"));
}

#[tokio::test]
async fn latency_advances_shared_clock() {
    let clock = FakeClock::new();
    let store = FakeStore::new("memory://a", clock.clone());
    store.set_latency(Duration::from_millis(40));

    let start = fence_core::Clock::now(&clock);
    store.set_if_absent("k", "v", TTL).await.unwrap();

    assert_eq!(
        fence_core::Clock::since(&clock, start),
        Duration::from_millis(40)
    );
}

#[tokio::test]
async fn seeded_value_blocks_other_writers() {
    let store = FakeStore::new("memory://a", FakeClock::new());
    store.seed("invoice:42", "foreign", TTL);

    assert!(!store.set_if_absent("invoice:42", "mine", TTL).await.unwrap());
    assert_eq!(store.holder("invoice:42").as_deref(), Some("foreign"));
}

#[tokio::test]
async fn closed_store_reopens_on_connect() {
    let connector = FakeConnector::new();
    let store = FakeStore::new("memory://a", FakeClock::new());
    connector.register(store.clone());

    store.close().await.unwrap();
    assert_eq!(
        store.set_if_absent("k", "v", TTL).await,
        Err(StoreError::Closed)
    );

    let conn = connector.connect("memory://a").await.unwrap();
    assert!(conn.set_if_absent("k", "v", TTL).await.unwrap());
    assert_eq!(connector.connects(), vec!["memory://a".to_string()]);
}

#[tokio::test]
async fn unknown_address_fails_to_connect() {
    let connector = FakeConnector::new();
    assert!(matches!(
        connector.connect("memory://missing").await,
        Err(StoreError::Connection(_))
    ));
}
