// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock coordinator: lifecycle, outstanding-lock accounting, graceful drain
//!
//! ```text
//! NotStarted --startup--> Running --shutdown--> Draining --idle--> Stopped
//!                            ^                                        |
//!                            +-------------- acquire_lock ------------+
//! ```
//!
//! The coordinator never excludes callers locally. Two tasks asking for the
//! same resource race through the stores exactly as two processes would.

use crate::counter::LockCounter;
use crate::error::CoordinatorError;
use crate::handle::LockHandle;
use crate::quorum::{close_stores, QuorumLock};
use fence_adapters::{ErrorSink, StoreConnector, StoreEvent, StoreOperation, TracingSink};
use fence_core::{Clock, CoordinatorConfig, LockRequest, SystemClock, TokenGen, UuidTokenGen};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Lifecycle state of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    NotStarted,
    Running,
    /// Shutdown requested; waiting for outstanding locks to be released
    Draining,
    Stopped,
}

impl std::fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CoordinatorState::NotStarted => "not-started",
            CoordinatorState::Running => "running",
            CoordinatorState::Draining => "draining",
            CoordinatorState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct Lifecycle<S, C, T> {
    state: CoordinatorState,
    algorithm: Option<Arc<QuorumLock<S, C, T>>>,
    counter: Arc<LockCounter>,
    /// Acquisitions admitted while Running that have not finished yet
    pending: usize,
}

type Algorithm<F, C, T> = QuorumLock<<F as StoreConnector>::Store, C, T>;

/// Handle type produced by a coordinator over connector `F`
pub type CoordinatorHandle<F, C, T> = LockHandle<<F as StoreConnector>::Store, C, T>;

pub struct LockCoordinator<F, C = SystemClock, T = UuidTokenGen>
where
    F: StoreConnector,
    C: Clock,
    T: TokenGen,
{
    connector: F,
    config: CoordinatorConfig,
    clock: C,
    tokens: T,
    sink: Arc<dyn ErrorSink>,
    lifecycle: Mutex<Lifecycle<F::Store, C, T>>,
    /// Serializes startup and shutdown; never held by acquisitions
    transition: tokio::sync::Mutex<()>,
    teardowns: AtomicUsize,
}

impl<F: StoreConnector> LockCoordinator<F> {
    /// Coordinator with the system clock, random tokens, and a tracing error sink
    pub fn new(connector: F, config: CoordinatorConfig) -> Self {
        Self::with_parts(connector, config, SystemClock, UuidTokenGen)
    }
}

impl<F, C, T> LockCoordinator<F, C, T>
where
    F: StoreConnector,
    C: Clock,
    T: TokenGen,
{
    pub fn with_parts(connector: F, config: CoordinatorConfig, clock: C, tokens: T) -> Self {
        Self {
            connector,
            config,
            clock,
            tokens,
            sink: Arc::new(TracingSink),
            lifecycle: Mutex::new(Lifecycle {
                state: CoordinatorState::NotStarted,
                algorithm: None,
                counter: Arc::new(LockCounter::new()),
                pending: 0,
            }),
            transition: tokio::sync::Mutex::new(()),
            teardowns: AtomicUsize::new(0),
        }
    }

    /// Replace the error sink (default: [`TracingSink`])
    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn state(&self) -> CoordinatorState {
        self.lifecycle().state
    }

    /// Holds outstanding on `resource` in the current run
    pub fn outstanding(&self, resource: &str) -> usize {
        self.lifecycle().counter.get(resource)
    }

    /// Every resource held during the current run, with its outstanding count
    pub fn counter_snapshot(&self) -> BTreeMap<String, usize> {
        self.lifecycle().counter.snapshot()
    }

    /// Completed teardown sequences since construction
    pub fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }

    fn lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle<F::Store, C, T>> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Connect every store and start accepting acquisitions. No-op when running.
    ///
    /// Every address is validated before the first connection is attempted.
    pub async fn startup(&self) -> Result<(), CoordinatorError> {
        let _transition = self.transition.lock().await;
        if self.state() == CoordinatorState::Running {
            return Ok(());
        }

        self.config.validate()?;

        let mut stores = Vec::with_capacity(self.config.stores.len());
        for address in &self.config.stores {
            match self.connector.connect(address).await {
                Ok(store) => stores.push(store),
                Err(source) => {
                    self.sink.report(&StoreEvent::new(
                        address.as_str(),
                        StoreOperation::Connect,
                        source.clone(),
                    ));
                    close_stores(&stores, self.config.store_timeout, self.sink.as_ref()).await;
                    return Err(CoordinatorError::Connect {
                        address: address.clone(),
                        source,
                    });
                }
            }
        }

        let algorithm: Algorithm<F, C, T> = QuorumLock::new(
            stores,
            self.config.tuning.clone(),
            self.clock.clone(),
            self.tokens.clone(),
        )?
        .with_store_timeout(self.config.store_timeout)
        .with_sink(Arc::clone(&self.sink));

        if self.config.stores.len() < 3 {
            tracing::warn!(
                stores = self.config.stores.len(),
                "fewer than three lock stores: losing one blocks every acquisition"
            );
        }
        tracing::info!(
            stores = self.config.stores.len(),
            quorum = algorithm.quorum(),
            "lock coordinator started"
        );

        let mut lifecycle = self.lifecycle();
        lifecycle.state = CoordinatorState::Running;
        lifecycle.algorithm = Some(Arc::new(algorithm));
        Ok(())
    }

    /// Acquire `resource` for at most `ttl`, starting the coordinator if needed
    pub async fn acquire_lock(
        &self,
        resource: &str,
        ttl: Duration,
    ) -> Result<CoordinatorHandle<F, C, T>, CoordinatorError> {
        let request = LockRequest::new(resource, ttl)?;
        let admission = self.admit().await?;

        let lock = admission.algorithm.acquire(&request).await?;
        let hold = admission.counter.hold(&request.resource);
        Ok(LockHandle::new(lock, Arc::clone(&admission.algorithm), hold))
    }

    /// Run `section` while holding `resource`.
    ///
    /// The lock is released on every exit path, including a panic inside
    /// `section`, before the section's output (or panic) reaches the caller.
    pub async fn run_exclusive<S, Fut, R>(
        &self,
        resource: &str,
        ttl: Duration,
        section: S,
    ) -> Result<R, CoordinatorError>
    where
        S: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        let handle = self.acquire_lock(resource, ttl).await?;
        let outcome = AssertUnwindSafe(async { section().await })
            .catch_unwind()
            .await;
        handle.release().await;

        match outcome {
            Ok(output) => Ok(output),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Drain outstanding locks, then close every store exactly once.
    ///
    /// Concurrent calls wait for the first one and then return without a
    /// second teardown. Calling on a coordinator that is not running is a no-op.
    pub async fn shutdown(&self) {
        let _transition = self.transition.lock().await;

        let algorithm = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != CoordinatorState::Running {
                return;
            }
            lifecycle.state = CoordinatorState::Draining;
            lifecycle.algorithm.clone()
        };
        tracing::info!("lock coordinator draining");

        self.drain().await;

        if let Some(algorithm) = algorithm {
            let failed = algorithm.close().await;
            if failed > 0 {
                tracing::warn!(failed, "some stores failed to close");
            }
        }

        let mut lifecycle = self.lifecycle();
        lifecycle.state = CoordinatorState::Stopped;
        lifecycle.algorithm = None;
        lifecycle.counter = Arc::new(LockCounter::new());
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        tracing::info!("lock coordinator stopped");
    }

    /// Poll until no hold is outstanding and no admitted acquisition is in flight
    async fn drain(&self) {
        loop {
            let (outstanding, pending) = {
                let lifecycle = self.lifecycle();
                (lifecycle.counter.total(), lifecycle.pending)
            };
            if outstanding == 0 && pending == 0 {
                return;
            }
            tracing::debug!(outstanding, pending, "waiting for locks to drain");
            tokio::time::sleep(self.config.drain_interval).await;
        }
    }

    /// Register an in-flight acquisition, starting the coordinator if needed
    async fn admit(&self) -> Result<Admission<'_, F, C, T>, CoordinatorError> {
        loop {
            {
                let mut lifecycle = self.lifecycle();
                match (lifecycle.state, lifecycle.algorithm.clone()) {
                    (CoordinatorState::Running, Some(algorithm)) => {
                        lifecycle.pending += 1;
                        return Ok(Admission {
                            coordinator: self,
                            algorithm,
                            counter: Arc::clone(&lifecycle.counter),
                        });
                    }
                    (CoordinatorState::Draining, _) => return Err(CoordinatorError::ShuttingDown),
                    _ => {}
                }
            }
            self.startup().await?;
        }
    }
}

/// An acquisition admitted while running; shutdown waits for it to finish
struct Admission<'a, F, C, T>
where
    F: StoreConnector,
    C: Clock,
    T: TokenGen,
{
    coordinator: &'a LockCoordinator<F, C, T>,
    algorithm: Arc<Algorithm<F, C, T>>,
    counter: Arc<LockCounter>,
}

impl<F, C, T> Drop for Admission<'_, F, C, T>
where
    F: StoreConnector,
    C: Clock,
    T: TokenGen,
{
    fn drop(&mut self) {
        let mut lifecycle = self.coordinator.lifecycle();
        lifecycle.pending = lifecycle.pending.saturating_sub(1);
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
