// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake lock store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MemoryStore, StoreAdapter, StoreConnector, StoreError};
use async_trait::async_trait;
use fence_core::FakeClock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Set {
        key: String,
        value: String,
        ttl: Duration,
    },
    Delete {
        key: String,
        value: String,
    },
    Close,
}

#[derive(Default)]
struct FakeState {
    offline: bool,
    failing_deletes: bool,
    latency: Duration,
    stall: Option<Duration>,
    closed: bool,
    close_count: usize,
    calls: Vec<StoreCall>,
}

/// Fake store with failure injection, backed by a [`MemoryStore`] on a [`FakeClock`].
///
/// Clones share state, so a test can keep one handle while the coordinator
/// owns another.
#[derive(Clone)]
pub struct FakeStore {
    inner: MemoryStore<FakeClock>,
    clock: FakeClock,
    state: Arc<Mutex<FakeState>>,
}

impl FakeStore {
    pub fn new(address: impl Into<String>, clock: FakeClock) -> Self {
        Self {
            inner: MemoryStore::with_clock(address, clock.clone()),
            clock,
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Simulate the store process dying (or coming back)
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Make deletes fail with a connection error while sets still work
    pub fn fail_deletes(&self, failing: bool) {
        self.state().failing_deletes = failing;
    }

    /// Advance the shared fake clock by `latency` on every round trip
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Block every round trip for `stall` of real time
    pub fn set_stall(&self, stall: Option<Duration>) {
        self.state().stall = stall;
    }

    /// Seed a value as if another holder had written it
    pub fn seed(&self, key: &str, value: &str, ttl: Duration) {
        self.inner.insert_if_absent(key, value, ttl);
    }

    /// Live value under `key`
    pub fn holder(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state().close_count
    }

    fn reopen(&self) {
        self.state().closed = false;
    }

    /// Record the call and apply injected faults
    async fn enter(&self, call: StoreCall) -> Result<(), StoreError> {
        let (stall, latency, offline, failing_delete, closed) = {
            let mut state = self.state();
            let failing_delete = state.failing_deletes && matches!(call, StoreCall::Delete { .. });
            state.calls.push(call);
            (
                state.stall,
                state.latency,
                state.offline,
                failing_delete,
                state.closed,
            )
        };

        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }
        if !latency.is_zero() {
            self.clock.advance(latency);
        }
        if closed {
            return Err(StoreError::Closed);
        }
        if offline || failing_delete {
            return Err(StoreError::Connection(format!(
                "{} is unreachable",
                self.inner.address()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreAdapter for FakeStore {
    fn address(&self) -> &str {
        self.inner.address()
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.enter(StoreCall::Set {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
        })
        .await?;
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.enter(StoreCall::Delete {
            key: key.to_string(),
            value: value.to_string(),
        })
        .await?;
        self.inner.delete_if_match(key, value).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut state = self.state();
        state.calls.push(StoreCall::Close);
        state.close_count += 1;
        state.closed = true;
        if state.offline {
            return Err(StoreError::Connection(format!(
                "{} is unreachable",
                self.inner.address()
            )));
        }
        Ok(())
    }
}

/// Fake connector handing out pre-registered [`FakeStore`]s by address
#[derive(Clone, Default)]
pub struct FakeConnector {
    stores: Arc<Mutex<HashMap<String, FakeStore>>>,
    connects: Arc<Mutex<Vec<String>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store; connecting to its address returns a shared handle
    pub fn register(&self, store: FakeStore) -> &Self {
        self.stores
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(store.address().to_string(), store);
        self
    }

    /// Addresses passed to `connect`, in order
    pub fn connects(&self) -> Vec<String> {
        self.connects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl StoreConnector for FakeConnector {
    type Store = FakeStore;

    async fn connect(&self, address: &str) -> Result<FakeStore, StoreError> {
        self.connects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(address.to_string());

        let store = self
            .stores
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::Connection(format!("no fake store at {}", address)))?;
        store.reopen();
        Ok(store)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
