// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fence-core: shared types for the Fence quorum lock coordinator
//!
//! This crate provides:
//! - Lock requests, resource identifiers, and the in-memory `Lock` value
//! - Fencing token generation
//! - Coordinator and tuning configuration (TOML + environment)
//! - A clock abstraction so lock validity can be tested deterministically

pub mod clock;
pub mod config;
pub mod lock;
pub mod request;
pub mod token;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, CoordinatorConfig, TuningConfig};
pub use lock::Lock;
pub use request::{LockRequest, RequestError, ResourceId};
pub use token::{FencingToken, SequentialTokenGen, TokenGen, UuidTokenGen};
