// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fence run -r <resource> -- <command>` - Run a command as a critical section

use anyhow::{Context, Result};
use clap::Args;
use fence_adapters::{AnyConnector, TracedConnector, MEMORY_SCHEME};
use fence_core::CoordinatorConfig;
use fence_engine::LockCoordinator;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitCode, ExitStatus};
use std::time::Duration;
use tokio::process::Command;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;

#[derive(Args)]
pub struct RunArgs {
    /// Resource to lock (e.g., "invoice:42")
    #[arg(short, long)]
    pub resource: String,

    /// Lock time-to-live in milliseconds
    #[arg(long, default_value_t = 30_000)]
    pub ttl: u64,

    /// Command and arguments to run while the lock is held
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

pub async fn run(args: RunArgs, config: CoordinatorConfig) -> Result<ExitCode> {
    // Installed before acquisition so a signal at any point ends in shutdown()
    let interrupt = Interrupt::install()?;

    if config.stores.iter().any(|a| a.starts_with(MEMORY_SCHEME)) {
        tracing::warn!("memory:// stores live inside this process and exclude no other process");
    }
    let coordinator = LockCoordinator::new(TracedConnector::new(AnyConnector::new()), config);
    let ttl = Duration::from_millis(args.ttl);

    let outcome = coordinator
        .run_exclusive(&args.resource, ttl, || {
            run_child(&args.command, interrupt.clone())
        })
        .await;
    coordinator.shutdown().await;

    let code = match (outcome, interrupt.received()) {
        (Ok(code), _) => code?,
        // Acquisition cut short by a signal still exits the shell way
        (Err(e), Some(signal)) => {
            tracing::debug!(error = %e, "acquisition ended after signal");
            signal_exit(signal)
        }
        (Err(e), None) => return Err(e.into()),
    };
    tracing::debug!(resource = %args.resource, code, "command finished");
    Ok(ExitCode::from(code))
}

/// Run the child to completion; SIGTERM or SIGINT kills it
async fn run_child(command: &[String], mut interrupt: Interrupt) -> Result<u8> {
    if let Some(signal) = interrupt.received() {
        return Ok(signal_exit(signal));
    }

    let (program, rest) = command.split_first().context("no command given")?;
    let mut child = Command::new(program)
        .args(rest)
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;

    tokio::select! {
        status = child.wait() => Ok(exit_code(status?)),
        signal = interrupt.wait() => {
            tracing::info!(signal, "stopping command");
            child.kill().await?;
            Ok(signal_exit(signal))
        }
    }
}

/// Termination signal latch shared by the acquisition and the child
#[derive(Clone)]
struct Interrupt {
    received: watch::Receiver<Option<i32>>,
}

impl Interrupt {
    fn install() -> Result<Self> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let (tx, rx) = watch::channel(None);

        tokio::spawn(async move {
            let received = tokio::select! {
                _ = sigterm.recv() => SIGTERM,
                _ = sigint.recv() => SIGINT,
            };
            tracing::info!(signal = received, "termination requested");
            let _ = tx.send(Some(received));
        });
        Ok(Self { received: rx })
    }

    fn received(&self) -> Option<i32> {
        *self.received.borrow()
    }

    async fn wait(&mut self) -> i32 {
        let received = self
            .received
            .wait_for(Option::is_some)
            .await
            .map(|received| *received);
        match received {
            Ok(signal) => signal.unwrap_or(SIGTERM),
            // Sender only drops after sending, so this never resolves early
            Err(_) => std::future::pending().await,
        }
    }
}

fn signal_exit(signal: i32) -> u8 {
    u8::try_from(128 + signal).unwrap_or(1)
}

/// Shell convention: 128 + signal number for signal deaths
fn exit_code(status: ExitStatus) -> u8 {
    match (status.code(), status.signal()) {
        (Some(code), _) => u8::try_from(code).unwrap_or(1),
        (None, Some(signal)) => signal_exit(signal),
        (None, None) => 1,
    }
}
