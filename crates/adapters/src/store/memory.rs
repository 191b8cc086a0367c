// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lock store
//!
//! Every connection opened for the same `memory://<name>` address shares one
//! keyspace, so several coordinators in a single process contend exactly as
//! separate processes would against one shared store.

use super::{StoreAdapter, StoreConnector, StoreError};
use async_trait::async_trait;
use fence_core::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Address scheme accepted by [`MemoryConnector`]
pub const MEMORY_SCHEME: &str = "memory://";

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

type Keyspace = Arc<Mutex<HashMap<String, Entry>>>;

/// A connection to an in-process keyspace with TTL expiry
#[derive(Clone)]
pub struct MemoryStore<C: Clock = SystemClock> {
    address: String,
    keyspace: Keyspace,
    closed: Arc<AtomicBool>,
    clock: C,
}

impl MemoryStore<SystemClock> {
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_clock(address, SystemClock)
    }
}

impl<C: Clock> MemoryStore<C> {
    pub fn with_clock(address: impl Into<String>, clock: C) -> Self {
        Self {
            address: address.into(),
            keyspace: Arc::new(Mutex::new(HashMap::new())),
            closed: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    /// A fresh connection to the same keyspace
    pub fn reconnect(&self) -> Self {
        Self {
            address: self.address.clone(),
            keyspace: Arc::clone(&self.keyspace),
            closed: Arc::new(AtomicBool::new(false)),
            clock: self.clock.clone(),
        }
    }

    /// Live value stored under `key`, if any
    pub fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let keyspace = self.keyspace.lock().unwrap_or_else(|e| e.into_inner());
        keyspace
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    pub(super) fn insert_if_absent(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let now = self.clock.now();
        let mut keyspace = self.keyspace.lock().unwrap_or_else(|e| e.into_inner());

        if keyspace.get(key).is_some_and(|entry| entry.expires_at > now) {
            return false;
        }

        keyspace.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl<C: Clock> StoreAdapter for MemoryStore<C> {
    fn address(&self) -> &str {
        &self.address
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.ensure_open()?;
        Ok(self.insert_if_absent(key, value, ttl))
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let now = self.clock.now();
        let mut keyspace = self.keyspace.lock().unwrap_or_else(|e| e.into_inner());

        match keyspace.get(key) {
            Some(entry) if entry.expires_at <= now => {
                // Expired entries are dropped lazily; nothing left to release
                keyspace.remove(key);
                Ok(false)
            }
            Some(entry) if entry.value == value => {
                keyspace.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

/// Opens [`MemoryStore`] connections for `memory://<name>` addresses
#[derive(Clone)]
pub struct MemoryConnector<C: Clock = SystemClock> {
    keyspaces: Arc<Mutex<HashMap<String, MemoryStore<C>>>>,
    clock: C,
}

impl MemoryConnector<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryConnector<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryConnector<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            keyspaces: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }
}

#[async_trait]
impl<C: Clock> StoreConnector for MemoryConnector<C> {
    type Store = MemoryStore<C>;

    async fn connect(&self, address: &str) -> Result<Self::Store, StoreError> {
        let name = address
            .strip_prefix(MEMORY_SCHEME)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StoreError::UnsupportedAddress(address.to_string()))?;

        let mut keyspaces = self.keyspaces.lock().unwrap_or_else(|e| e.into_inner());
        let root = keyspaces
            .entry(name.to_string())
            .or_insert_with(|| MemoryStore::with_clock(address, self.clock.clone()));
        Ok(root.reconnect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
