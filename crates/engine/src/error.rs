// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the lock engine

use fence_adapters::StoreError;
use fence_core::{ConfigError, RequestError};
use std::time::Duration;
use thiserror::Error;

/// Why a single acquisition attempt did not produce a lock
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("{acknowledged} stores acknowledged, {required} required")]
    NoQuorum { acknowledged: usize, required: usize },
    #[error("validity window closed after {}ms", .elapsed.as_millis())]
    ValidityExpired { elapsed: Duration },
}

/// Quorum was not reached within the retry budget
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to lock {resource} after {attempts} attempts: {last}")]
pub struct AcquireError {
    pub resource: String,
    pub attempts: u32,
    /// Outcome of the final attempt
    pub last: AttemptFailure,
}

/// Errors surfaced to callers of the coordinator
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid lock request: {0}")]
    Request(#[from] RequestError),
    #[error("failed to connect to store {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Acquisition(#[from] AcquireError),
    #[error("lock coordinator is shutting down")]
    ShuttingDown,
}
