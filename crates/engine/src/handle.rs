// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot release handle returned by a successful acquisition

use crate::counter::CounterHold;
use crate::quorum::QuorumLock;
use fence_adapters::StoreAdapter;
use fence_core::{Clock, Lock, ResourceId, TokenGen};
use std::sync::Arc;

/// Proof of holding a quorum lock.
///
/// [`LockHandle::release`] consumes the handle, so a lock is released at most
/// once. A handle dropped without `release` still gives back its count and
/// schedules a best-effort release on the current Tokio runtime.
pub struct LockHandle<S, C, T>
where
    S: StoreAdapter,
    C: Clock,
    T: TokenGen,
{
    lock: Lock,
    algorithm: Arc<QuorumLock<S, C, T>>,
    hold: Option<CounterHold>,
}

impl<S, C, T> LockHandle<S, C, T>
where
    S: StoreAdapter,
    C: Clock,
    T: TokenGen,
{
    pub(crate) fn new(lock: Lock, algorithm: Arc<QuorumLock<S, C, T>>, hold: CounterHold) -> Self {
        Self {
            lock,
            algorithm,
            hold: Some(hold),
        }
    }

    pub fn lock(&self) -> &Lock {
        &self.lock
    }

    pub fn resource(&self) -> &ResourceId {
        &self.lock.resource
    }

    /// Release on every store, then give back the outstanding count.
    ///
    /// Store failures go to the error sink; the count is returned even if
    /// this future is dropped part way through.
    pub async fn release(mut self) {
        let _hold = self.hold.take();
        let summary = self.algorithm.release(&self.lock).await;
        tracing::debug!(
            resource = %self.lock.resource,
            released = summary.released,
            missing = summary.missing,
            failed = summary.failed,
            "lock released"
        );
    }
}

impl<S, C, T> std::fmt::Debug for LockHandle<S, C, T>
where
    S: StoreAdapter,
    C: Clock,
    T: TokenGen,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockHandle")
            .field("lock", &self.lock)
            .field("released", &self.hold.is_none())
            .finish()
    }
}

impl<S, C, T> Drop for LockHandle<S, C, T>
where
    S: StoreAdapter,
    C: Clock,
    T: TokenGen,
{
    fn drop(&mut self) {
        let Some(hold) = self.hold.take() else {
            return;
        };
        drop(hold);

        tracing::warn!(resource = %self.lock.resource, "lock handle dropped without release");
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let algorithm = Arc::clone(&self.algorithm);
            let lock = self.lock.clone();
            runtime.spawn(async move {
                algorithm.release(&lock).await;
            });
        }
    }
}
