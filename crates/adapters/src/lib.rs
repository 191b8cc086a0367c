// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for lock stores and partial-failure reporting

pub mod sink;
pub mod store;
pub mod traced;

pub use sink::{ErrorSink, NoOpSink, StoreEvent, StoreOperation, TracingSink};
pub use store::{
    AnyConnector, AnyStore, FileConnector, FileStore, MemoryConnector, MemoryStore, StoreAdapter,
    StoreConnector, StoreError, FILE_SCHEME, MEMORY_SCHEME,
};
pub use traced::{TracedConnector, TracedStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use sink::FakeErrorSink;
#[cfg(any(test, feature = "test-support"))]
pub use store::{FakeConnector, FakeStore, StoreCall};
