// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Partial-failure reporting
//!
//! The quorum algorithm tolerates minority store failures by design. Each
//! tolerated failure is handed to an [`ErrorSink`] instead of being returned,
//! so a dead store is visible without ever failing the caller.

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeErrorSink;

use crate::store::StoreError;
use std::fmt;

/// Which store round trip failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Connect,
    Acquire,
    Release,
    Close,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOperation::Connect => "connect",
            StoreOperation::Acquire => "acquire",
            StoreOperation::Release => "release",
            StoreOperation::Close => "close",
        };
        f.write_str(name)
    }
}

/// A tolerated failure of one store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    /// Address of the store that failed
    pub store: String,
    pub operation: StoreOperation,
    /// Resource being locked, when the operation concerned one
    pub resource: Option<String>,
    pub error: StoreError,
}

impl StoreEvent {
    pub fn new(store: impl Into<String>, operation: StoreOperation, error: StoreError) -> Self {
        Self {
            store: store.into(),
            operation,
            resource: None,
            error,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

/// Receives tolerated store failures. Implementations must not panic.
pub trait ErrorSink: Send + Sync + 'static {
    fn report(&self, event: &StoreEvent);
}

/// Writes every event as a `warn` record
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, event: &StoreEvent) {
        tracing::warn!(
            store = %event.store,
            operation = %event.operation,
            resource = event.resource.as_deref().unwrap_or("-"),
            error = %event.error,
            "store operation failed"
        );
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl ErrorSink for NoOpSink {
    fn report(&self, _event: &StoreEvent) {}
}
