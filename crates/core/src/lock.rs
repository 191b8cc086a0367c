// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ephemeral value produced by a successful quorum acquisition
//!
//! A `Lock` exists only in the memory of the caller that acquired it. The
//! stores hold nothing but `resource -> token` with an expiry, so once the
//! validity window passes the lock must be treated as lost.

use crate::clock::Clock;
use crate::request::ResourceId;
use crate::token::FencingToken;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct Lock {
    pub resource: ResourceId,
    pub token: FencingToken,
    /// TTL requested from each store
    pub ttl: Duration,
    /// Validity window left after subtracting acquisition time and drift
    pub validity: Duration,
    /// When the attempt that won this lock started
    pub acquired_at: Instant,
    /// Addresses of the stores that acknowledged the set
    pub stores: Vec<String>,
}

impl Lock {
    /// Instant after which exclusivity is no longer guaranteed
    pub fn expires_at(&self) -> Instant {
        self.acquired_at + self.validity
    }

    /// Validity left as of `clock.now()`
    pub fn remaining(&self, clock: &impl Clock) -> Duration {
        self.expires_at().saturating_duration_since(clock.now())
    }

    pub fn is_valid(&self, clock: &impl Clock) -> bool {
        clock.now() < self.expires_at()
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
