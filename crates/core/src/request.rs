// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock requests and resource identifiers

use std::time::Duration;
use thiserror::Error;

/// Errors from validating a lock request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("resource identifier must not be empty")]
    EmptyResource,
    #[error("lock ttl must be positive (resource: {0})")]
    ZeroTtl(String),
}

/// Opaque key naming a critical section
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Result<Self, RequestError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RequestError::EmptyResource);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated request to hold `resource` for at most `ttl`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockRequest {
    pub resource: ResourceId,
    pub ttl: Duration,
}

impl LockRequest {
    pub fn new(resource: impl Into<String>, ttl: Duration) -> Result<Self, RequestError> {
        let resource = ResourceId::new(resource)?;
        // Sub-millisecond TTLs round to zero at the store
        if ttl.as_millis() == 0 {
            return Err(RequestError::ZeroTtl(resource.0));
        }
        Ok(Self { resource, ttl })
    }

    /// Build a request from a millisecond TTL
    pub fn from_millis(resource: impl Into<String>, ttl_ms: u64) -> Result<Self, RequestError> {
        Self::new(resource, Duration::from_millis(ttl_ms))
    }
}
