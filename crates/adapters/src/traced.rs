// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrappers for consistent observability

use crate::store::{StoreAdapter, StoreConnector, StoreError};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Wrapper that adds tracing to any StoreAdapter
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: StoreAdapter> StoreAdapter for TracedStore<S> {
    fn address(&self) -> &str {
        self.inner.address()
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!(
            "store.set",
            store = self.inner.address(),
            key,
            ttl_ms = ttl.as_millis() as u64
        );

        async {
            let start = Instant::now();
            let result = self.inner.set_if_absent(key, value, ttl).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(true) => tracing::debug!(elapsed_ms, "acquired"),
                Ok(false) => tracing::debug!(elapsed_ms, "held elsewhere"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "set failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.delete", store = self.inner.address(), key);

        async {
            let result = self.inner.delete_if_match(key, value).await;
            // false is normal when the TTL already expired
            match &result {
                Ok(released) => tracing::debug!(released, "deleted"),
                Err(e) => tracing::warn!(error = %e, "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn close(&self) -> Result<(), StoreError> {
        let result = self.inner.close().await;
        match &result {
            Ok(()) => tracing::info!(store = self.inner.address(), "store closed"),
            Err(e) => tracing::warn!(store = self.inner.address(), error = %e, "close failed"),
        }
        result
    }
}

/// Connector whose stores are wrapped in [`TracedStore`]
#[derive(Clone)]
pub struct TracedConnector<F> {
    inner: F,
}

impl<F> TracedConnector<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<F: StoreConnector> StoreConnector for TracedConnector<F> {
    type Store = TracedStore<F::Store>;

    async fn connect(&self, address: &str) -> Result<Self::Store, StoreError> {
        let start = Instant::now();
        let result = self.inner.connect(address).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(store = address, elapsed_ms, "store connected"),
            Err(e) => tracing::error!(store = address, elapsed_ms, error = %e, "connect failed"),
        }
        result.map(TracedStore::new)
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
