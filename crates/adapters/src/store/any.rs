// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store selection by address scheme

use super::file::{FileConnector, FileStore, FILE_SCHEME};
use super::memory::{MemoryConnector, MemoryStore, MEMORY_SCHEME};
use super::{StoreAdapter, StoreConnector, StoreError};
use async_trait::async_trait;
use std::time::Duration;

/// A connection to any built-in store kind
#[derive(Clone)]
pub enum AnyStore {
    Memory(MemoryStore),
    File(FileStore),
}

#[async_trait]
impl StoreAdapter for AnyStore {
    fn address(&self) -> &str {
        match self {
            AnyStore::Memory(store) => store.address(),
            AnyStore::File(store) => store.address(),
        }
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        match self {
            AnyStore::Memory(store) => store.set_if_absent(key, value, ttl).await,
            AnyStore::File(store) => store.set_if_absent(key, value, ttl).await,
        }
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        match self {
            AnyStore::Memory(store) => store.delete_if_match(key, value).await,
            AnyStore::File(store) => store.delete_if_match(key, value).await,
        }
    }

    async fn close(&self) -> Result<(), StoreError> {
        match self {
            AnyStore::Memory(store) => store.close().await,
            AnyStore::File(store) => store.close().await,
        }
    }
}

/// Connects `memory://<name>` and `file://<dir>` addresses
#[derive(Clone, Default)]
pub struct AnyConnector {
    memory: MemoryConnector,
}

impl AnyConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreConnector for AnyConnector {
    type Store = AnyStore;

    async fn connect(&self, address: &str) -> Result<AnyStore, StoreError> {
        if address.starts_with(MEMORY_SCHEME) {
            self.memory.connect(address).await.map(AnyStore::Memory)
        } else if address.starts_with(FILE_SCHEME) {
            FileConnector.connect(address).await.map(AnyStore::File)
        } else {
            Err(StoreError::UnsupportedAddress(address.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn dispatches_on_scheme() {
        let dir = TempDir::new().unwrap();
        let connector = AnyConnector::new();

        let memory = connector.connect("memory://main").await.unwrap();
        assert!(matches!(memory, AnyStore::Memory(_)));

        let file_address = format!("file://{}", dir.path().display());
        let file = connector.connect(&file_address).await.unwrap();
        assert!(matches!(file, AnyStore::File(_)));
        assert_eq!(file.address(), file_address);
    }

    #[tokio::test]
    async fn unknown_scheme_is_unsupported() {
        let result = AnyConnector::new().connect("redis://localhost:6379").await;
        assert!(matches!(
            result,
            Err(StoreError::UnsupportedAddress(address)) if address == "redis://localhost:6379"
        ));
    }

    #[tokio::test]
    async fn memory_connections_share_keyspace_by_name() {
        let connector = AnyConnector::new();
        let a = connector.connect("memory://main").await.unwrap();
        let b = connector.connect("memory://main").await.unwrap();

        assert!(a.set_if_absent("k", "a", Duration::from_secs(5)).await.unwrap());
        assert!(!b.set_if_absent("k", "b", Duration::from_secs(5)).await.unwrap());
    }
}
