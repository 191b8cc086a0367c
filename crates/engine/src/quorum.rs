// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Majority-vote lock acquisition across independent stores
//!
//! An attempt writes `resource -> token` to every store concurrently. It wins
//! when a strict majority acknowledged and time is left in the validity
//! window:
//!
//! ```text
//! validity = ttl - elapsed - ttl * drift_factor - clock_skew_margin
//! ```
//!
//! Losing attempts clean up after themselves and retry after
//! `retry_delay + uniform(0, retry_jitter)`. Individual store failures are
//! votes against, reported to the [`ErrorSink`], never returned.

use crate::error::{AcquireError, AttemptFailure};
use fence_adapters::{ErrorSink, StoreAdapter, StoreError, StoreEvent, StoreOperation, TracingSink};
use fence_core::{Clock, ConfigError, FencingToken, Lock, LockRequest, TokenGen, TuningConfig};
use futures::future::join_all;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// How one store answered a set
#[derive(Debug)]
enum Vote {
    Granted,
    Denied,
    /// Outcome unknown; the write may still have landed
    Failed,
}

/// Result of fanning a release out to every store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseSummary {
    /// Stores that still held our token and deleted it
    pub released: usize,
    /// Stores that no longer held our token (expired or never set)
    pub missing: usize,
    /// Stores that failed; reported to the error sink
    pub failed: usize,
}

pub struct QuorumLock<S, C, T> {
    stores: Vec<S>,
    tuning: TuningConfig,
    store_timeout: Duration,
    clock: C,
    tokens: T,
    sink: Arc<dyn ErrorSink>,
}

impl<S, C, T> QuorumLock<S, C, T>
where
    S: StoreAdapter,
    C: Clock,
    T: TokenGen,
{
    /// Fails when `tuning` does not validate
    pub fn new(
        stores: Vec<S>,
        tuning: TuningConfig,
        clock: C,
        tokens: T,
    ) -> Result<Self, ConfigError> {
        tuning.validate()?;
        Ok(Self {
            stores,
            tuning,
            store_timeout: Duration::from_millis(500),
            clock,
            tokens,
            sink: Arc::new(TracingSink),
        })
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Acknowledgements needed for a majority of the configured stores
    pub fn quorum(&self) -> usize {
        self.stores.len() / 2 + 1
    }

    pub fn store_addresses(&self) -> Vec<String> {
        self.stores.iter().map(|s| s.address().to_string()).collect()
    }

    /// Acquire `request.resource` on a majority of stores, retrying within budget
    pub async fn acquire(&self, request: &LockRequest) -> Result<Lock, AcquireError> {
        let attempts = self.tuning.retry_count.max(1);
        let mut last = AttemptFailure::NoQuorum {
            acknowledged: 0,
            required: self.quorum(),
        };

        for attempt in 1..=attempts {
            match self.attempt(request).await {
                Ok(lock) => {
                    tracing::debug!(
                        resource = %request.resource,
                        attempt,
                        validity_ms = lock.validity.as_millis() as u64,
                        "lock acquired"
                    );
                    return Ok(lock);
                }
                Err(failure) => {
                    tracing::debug!(
                        resource = %request.resource,
                        attempt,
                        attempts,
                        %failure,
                        "acquisition attempt failed"
                    );
                    last = failure;
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.backoff()).await;
            }
        }

        Err(AcquireError {
            resource: request.resource.to_string(),
            attempts,
            last,
        })
    }

    /// Delete our token from every store. Best effort: the TTL is the backstop.
    pub async fn release(&self, lock: &Lock) -> ReleaseSummary {
        let resource = lock.resource.as_str();
        let outcomes = join_all(
            self.stores
                .iter()
                .map(|store| self.delete(store, resource, &lock.token)),
        )
        .await;

        let mut summary = ReleaseSummary::default();
        for outcome in outcomes {
            match outcome {
                Some(true) => summary.released += 1,
                Some(false) => summary.missing += 1,
                None => summary.failed += 1,
            }
        }
        summary
    }

    /// Close every store connection, reporting failures. Returns the failure count.
    pub async fn close(&self) -> usize {
        close_stores(&self.stores, self.store_timeout, self.sink.as_ref()).await
    }

    async fn attempt(&self, request: &LockRequest) -> Result<Lock, AttemptFailure> {
        let token = self.tokens.next();
        let resource = request.resource.as_str();
        let start = self.clock.now();

        let votes = join_all(
            self.stores
                .iter()
                .map(|store| self.set(store, resource, &token, request.ttl)),
        )
        .await;
        let elapsed = self.clock.since(start);

        let acknowledged: Vec<String> = self
            .stores
            .iter()
            .zip(&votes)
            .filter(|(_, vote)| matches!(vote, Vote::Granted))
            .map(|(store, _)| store.address().to_string())
            .collect();

        let failure = if acknowledged.len() < self.quorum() {
            AttemptFailure::NoQuorum {
                acknowledged: acknowledged.len(),
                required: self.quorum(),
            }
        } else {
            match self.validity(request.ttl, elapsed) {
                Some(validity) => {
                    return Ok(Lock {
                        resource: request.resource.clone(),
                        token,
                        ttl: request.ttl,
                        validity,
                        acquired_at: start,
                        stores: acknowledged,
                    });
                }
                None => AttemptFailure::ValidityExpired { elapsed },
            }
        };

        // Undo writes that landed, or might have, before the next attempt
        let cleanup = self
            .stores
            .iter()
            .zip(&votes)
            .filter(|(_, vote)| !matches!(vote, Vote::Denied))
            .map(|(store, _)| self.delete(store, resource, &token));
        join_all(cleanup).await;

        Err(failure)
    }

    /// Time left after drift, or None when the window is already closed
    fn validity(&self, ttl: Duration, elapsed: Duration) -> Option<Duration> {
        let drift = ttl
            .mul_f64(self.tuning.drift_factor)
            .saturating_add(self.tuning.clock_skew_margin);
        ttl.checked_sub(elapsed)
            .and_then(|left| left.checked_sub(drift))
            .filter(|validity| !validity.is_zero())
    }

    fn backoff(&self) -> Duration {
        let jitter_ms = u64::try_from(self.tuning.retry_jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.tuning
            .retry_delay
            .saturating_add(Duration::from_millis(extra))
    }

    async fn set(&self, store: &S, resource: &str, token: &FencingToken, ttl: Duration) -> Vote {
        let op = store.set_if_absent(resource, token.as_str(), ttl);
        match bounded(self.store_timeout, op).await {
            Ok(true) => Vote::Granted,
            Ok(false) => Vote::Denied,
            Err(error) => {
                self.sink.report(
                    &StoreEvent::new(store.address(), StoreOperation::Acquire, error)
                        .with_resource(resource),
                );
                Vote::Failed
            }
        }
    }

    async fn delete(&self, store: &S, resource: &str, token: &FencingToken) -> Option<bool> {
        let op = store.delete_if_match(resource, token.as_str());
        match bounded(self.store_timeout, op).await {
            Ok(released) => Some(released),
            Err(error) => {
                self.sink.report(
                    &StoreEvent::new(store.address(), StoreOperation::Release, error)
                        .with_resource(resource),
                );
                None
            }
        }
    }
}

/// Close `stores`, reporting each failure to `sink`
pub(crate) async fn close_stores<S: StoreAdapter>(
    stores: &[S],
    timeout: Duration,
    sink: &dyn ErrorSink,
) -> usize {
    let results = join_all(stores.iter().map(|store| bounded(timeout, store.close()))).await;

    let mut failed = 0;
    for (store, result) in stores.iter().zip(results) {
        if let Err(error) = result {
            sink.report(&StoreEvent::new(store.address(), StoreOperation::Close, error));
            failed += 1;
        }
    }
    failed
}

/// Run a store round trip under `timeout`
async fn bounded<R>(
    timeout: Duration,
    op: impl Future<Output = Result<R, StoreError>>,
) -> Result<R, StoreError> {
    tokio::time::timeout(timeout, op)
        .await
        .unwrap_or(Err(StoreError::Timeout(timeout)))
}

#[cfg(test)]
#[path = "quorum_tests.rs"]
mod tests;
