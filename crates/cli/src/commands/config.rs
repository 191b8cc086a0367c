// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fence config` - Print the effective configuration

use crate::error::FenceError;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Args;
use fence_core::CoordinatorConfig;
use std::path::Path;

#[derive(Args)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "toml")]
    pub format: OutputFormat,
}

/// Layer configuration sources: file (or defaults), then environment, then `--store`
pub fn resolve(path: Option<&Path>, stores: &[String]) -> Result<CoordinatorConfig> {
    let base = match path {
        Some(path) => CoordinatorConfig::load(path)
            .map_err(|e| FenceError::config_unreadable(path, e))?,
        None => CoordinatorConfig::default(),
    };
    let mut config = base.apply_env()?;
    if !stores.is_empty() {
        config.stores = stores.to_vec();
    }
    if config.stores.is_empty() {
        return Err(FenceError::no_stores().into());
    }
    Ok(config)
}

pub fn show(config: &CoordinatorConfig, format: OutputFormat) -> Result<()> {
    config.validate()?;
    output::print(config, format)
}
