// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fencing token generation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Value written to every store for one acquisition attempt.
///
/// Only the attempt that wrote a token may delete it, so a holder whose lock
/// already expired cannot release a lock re-acquired by someone else.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FencingToken(String);

impl FencingToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FencingToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates a fresh token per acquisition attempt
pub trait TokenGen: Clone + Send + Sync + 'static {
    fn next(&self) -> FencingToken;
}

/// Random v4 UUID tokens for production use
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidTokenGen;

impl TokenGen for UuidTokenGen {
    fn next(&self) -> FencingToken {
        FencingToken(uuid::Uuid::new_v4().to_string())
    }
}

/// Predictable tokens for tests
#[derive(Clone, Debug)]
pub struct SequentialTokenGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialTokenGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialTokenGen {
    fn default() -> Self {
        Self::new("token")
    }
}

impl TokenGen for SequentialTokenGen {
    fn next(&self) -> FencingToken {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        FencingToken(format!("{}-{}", self.prefix, n))
    }
}
