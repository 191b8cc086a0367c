// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

const TTL: Duration = Duration::from_millis(5000);

fn address(dir: &TempDir) -> String {
    format!("{FILE_SCHEME}{}", dir.path().join("locks").display())
}

#[tokio::test]
async fn connections_to_one_directory_share_keys() {
    let dir = TempDir::new().unwrap();
    let a = FileConnector.connect(&address(&dir)).await.unwrap();
    let b = FileConnector.connect(&address(&dir)).await.unwrap();

    assert!(a.set_if_absent("invoice:42", "token-a", TTL).await.unwrap());
    assert!(!b.set_if_absent("invoice:42", "token-b", TTL).await.unwrap());
    assert_eq!(b.get("invoice:42").unwrap().as_deref(), Some("token-a"));
}

#[tokio::test]
async fn delete_requires_matching_value() {
    let dir = TempDir::new().unwrap();
    let store = FileConnector.connect(&address(&dir)).await.unwrap();
    store.set_if_absent("invoice:42", "token-a", TTL).await.unwrap();

    assert!(!store.delete_if_match("invoice:42", "token-b").await.unwrap());
    assert_eq!(store.get("invoice:42").unwrap().as_deref(), Some("token-a"));

    assert!(store.delete_if_match("invoice:42", "token-a").await.unwrap());
    assert_eq!(store.get("invoice:42").unwrap(), None);
    assert!(!store.delete_if_match("invoice:42", "token-a").await.unwrap());
}

#[tokio::test]
async fn expired_value_can_be_taken_over() {
    let dir = TempDir::new().unwrap();
    let store = FileConnector.connect(&address(&dir)).await.unwrap();
    let short = Duration::from_millis(20);
    store.set_if_absent("invoice:42", "token-a", short).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(store.get("invoice:42").unwrap(), None);
    assert!(!store.delete_if_match("invoice:42", "token-a").await.unwrap());
    assert!(store.set_if_absent("invoice:42", "token-b", TTL).await.unwrap());
}

#[tokio::test]
async fn resource_names_map_to_safe_file_names() {
    let dir = TempDir::new().unwrap();
    let store = FileConnector.connect(&address(&dir)).await.unwrap();

    assert!(store.set_if_absent("../escape/me", "v", TTL).await.unwrap());

    let names: Vec<String> = fs::read_dir(store.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(KEY_PREFIX))
        .collect();
    assert_eq!(names, vec![format!("{KEY_PREFIX}2e2e2f6573636170652f6d65")]);
}

#[tokio::test]
async fn torn_entry_counts_as_absent() {
    let dir = TempDir::new().unwrap();
    let store = FileConnector.connect(&address(&dir)).await.unwrap();
    fs::write(key_path(store.dir(), "invoice:42"), "not-a-timestamp").unwrap();

    assert!(store.set_if_absent("invoice:42", "token-a", TTL).await.unwrap());
}

#[tokio::test]
async fn concurrent_connections_elect_one_writer() {
    let dir = TempDir::new().unwrap();
    let address = address(&dir);

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let address = address.clone();
            tokio::spawn(async move {
                let store = FileConnector.connect(&address).await.unwrap();
                store
                    .set_if_absent("invoice:42", &format!("token-{i}"), TTL)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn closed_connection_rejects_operations() {
    let dir = TempDir::new().unwrap();
    let store = FileConnector.connect(&address(&dir)).await.unwrap();
    let other = FileConnector.connect(&address(&dir)).await.unwrap();

    store.close().await.unwrap();

    assert_eq!(
        store.set_if_absent("k", "v", TTL).await,
        Err(StoreError::Closed)
    );
    assert_eq!(store.close().await, Err(StoreError::Closed));
    assert!(other.set_if_absent("k", "v", TTL).await.unwrap());
}

#[yare::parameterized(
    memory = { "memory://main" },
    empty_path = { "file://" },
    no_scheme = { "/tmp/locks" },
)]
fn connector_rejects_other_addresses(address: &str) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let result = runtime.block_on(FileConnector.connect(address));
    assert!(matches!(result, Err(StoreError::UnsupportedAddress(a)) if a == address));
}
