// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::Path;
use std::process::{Child, ExitStatus};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const FENCE_VARS: &[&str] = &[
    "FENCE_STORES",
    "FENCE_DRIFT_FACTOR",
    "FENCE_RETRY_COUNT",
    "FENCE_RETRY_DELAY_MS",
    "FENCE_RETRY_JITTER_MS",
    "FENCE_STORE_TIMEOUT_MS",
    "FENCE_LOG",
    "RUST_LOG",
];

/// `fence` with no configuration leaking in from the caller's environment
pub fn fence() -> Command {
    let mut cmd = Command::cargo_bin("fence").unwrap();
    for var in FENCE_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Same as [`fence`], as a std command for background processes
pub fn fence_process() -> std::process::Command {
    let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("fence"));
    for var in FENCE_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// A `file://` store address inside `temp`
pub fn file_store(temp: &TempDir) -> String {
    format!("file://{}", temp.path().join("store").display())
}

/// Poll until `path` exists
pub fn wait_for_file(path: &Path, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

/// Wait for `child`, killing it if it outlives `timeout`
pub fn wait_with_timeout(child: &mut Child, timeout: Duration) -> ExitStatus {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() >= deadline {
            child.kill().unwrap();
            panic!("fence did not exit within {timeout:?}");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
