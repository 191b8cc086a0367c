// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fence - run commands under a quorum lock

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, run};
use error::FenceError;
use std::path::PathBuf;
use std::process::ExitCode;

/// Filter variable checked before `RUST_LOG`
const LOG_ENV: &str = "FENCE_LOG";

#[derive(Parser)]
#[command(
    name = "fence",
    version,
    about = "Fence - distributed locks over a quorum of stores"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Lock store address, repeatable: file://<dir> (shared between processes)
    /// or memory://<name> (this process only). Overrides file and environment.
    #[arg(long = "store", global = true)]
    stores: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command while holding a lock
    Run(run::RunArgs),
    /// Print the effective configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            if let Some(fence) = e.downcast_ref::<FenceError>() {
                eprint!("{fence}");
            } else {
                eprintln!("error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let settings = config::resolve(cli.config.as_deref(), &cli.stores)?;
    match cli.command {
        Commands::Run(args) => run::run(args, settings).await,
        Commands::Config(args) => {
            config::show(&settings, args.format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
