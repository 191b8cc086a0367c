// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock store adapters
//!
//! A store is one independent failure domain. The quorum algorithm only needs
//! two atomic primitives from it: set-if-absent with expiry, and
//! delete-if-value-matches.

mod any;
mod file;
mod memory;

pub use any::{AnyConnector, AnyStore};
pub use file::{FileConnector, FileStore, FILE_SCHEME};
pub use memory::{MemoryConnector, MemoryStore, MEMORY_SCHEME};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeConnector, FakeStore, StoreCall};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from a single store round trip
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("connection closed")]
    Closed,
    #[error("store I/O failed: {0}")]
    Io(String),
    #[error("unsupported store address: {0}")]
    UnsupportedAddress(String),
}

/// One connection to an independent lock store
#[async_trait]
pub trait StoreAdapter: Clone + Send + Sync + 'static {
    /// Address this connection was opened with
    fn address(&self) -> &str;

    /// Atomically set `key` to `value` with expiry `ttl` unless a live value exists.
    ///
    /// Returns `Ok(true)` when this call wrote the value.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, StoreError>;

    /// Atomically delete `key` only if it still holds `value`.
    ///
    /// Returns `Ok(true)` when this call removed the value.
    async fn delete_if_match(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Close the connection
    async fn close(&self) -> Result<(), StoreError>;
}

/// Opens store connections from configured addresses
#[async_trait]
pub trait StoreConnector: Send + Sync + 'static {
    type Store: StoreAdapter;

    async fn connect(&self, address: &str) -> Result<Self::Store, StoreError>;
}
