// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Fence lock engine: quorum acquisition and the lock coordinator

mod coordinator;
mod counter;
mod error;
mod handle;
mod quorum;

pub use coordinator::{CoordinatorHandle, CoordinatorState, LockCoordinator};
pub use counter::{CounterHold, LockCounter};
pub use error::{AcquireError, AttemptFailure, CoordinatorError};
pub use handle::LockHandle;
pub use quorum::{QuorumLock, ReleaseSummary};
