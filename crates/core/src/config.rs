// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration
//!
//! Loaded from a TOML file, then overridden from `FENCE_*` environment
//! variables. Nothing connects to a store until [`CoordinatorConfig::validate`]
//! has accepted every address.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_STORES: &str = "FENCE_STORES";
pub const ENV_DRIFT_FACTOR: &str = "FENCE_DRIFT_FACTOR";
pub const ENV_RETRY_COUNT: &str = "FENCE_RETRY_COUNT";
pub const ENV_RETRY_DELAY_MS: &str = "FENCE_RETRY_DELAY_MS";
pub const ENV_RETRY_JITTER_MS: &str = "FENCE_RETRY_JITTER_MS";
pub const ENV_STORE_TIMEOUT_MS: &str = "FENCE_STORE_TIMEOUT_MS";

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no lock stores configured (set FENCE_STORES or `stores` in the config file)")]
    NoStores,
    #[error("address for store #{index} is missing")]
    MissingAddress { index: usize },
    #[error("drift factor must be in [0, 1), got {0}")]
    DriftFactor(f64),
    #[error("retry count must be at least 1")]
    RetryCount,
    #[error("store timeout must be positive")]
    StoreTimeout,
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Quorum algorithm tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TuningConfig {
    /// Fraction of the TTL subtracted from validity to absorb clock drift
    pub drift_factor: f64,
    /// Total acquisition attempts, including the first
    pub retry_count: u32,
    /// Base wait between attempts
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// Upper bound of the uniform random wait added to `retry_delay`
    #[serde(with = "humantime_serde")]
    pub retry_jitter: Duration,
    /// Fixed margin subtracted from validity on top of the drift
    #[serde(with = "humantime_serde")]
    pub clock_skew_margin: Duration,
}

impl TuningConfig {
    pub fn with_drift_factor(mut self, drift_factor: f64) -> Self {
        self.drift_factor = drift_factor;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_retry_jitter(mut self, jitter: Duration) -> Self {
        self.retry_jitter = jitter;
        self
    }

    pub fn with_clock_skew_margin(mut self, margin: Duration) -> Self {
        self.clock_skew_margin = margin;
        self
    }

    /// Worst-case time spent waiting between attempts, excluding store round trips
    pub fn max_backoff(&self) -> Duration {
        self.retry_delay
            .saturating_add(self.retry_jitter)
            .saturating_mul(self.retry_count)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.drift_factor) {
            return Err(ConfigError::DriftFactor(self.drift_factor));
        }
        if self.retry_count == 0 {
            return Err(ConfigError::RetryCount);
        }
        Ok(())
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            drift_factor: 0.01,
            retry_count: 10,
            retry_delay: Duration::from_millis(200),
            retry_jitter: Duration::from_millis(200),
            clock_skew_margin: Duration::from_millis(2),
        }
    }
}

/// Everything the coordinator needs to start
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Addresses of independent lock stores, in order
    pub stores: Vec<String>,
    /// Per-store bound on every set/delete round trip
    #[serde(with = "humantime_serde")]
    pub store_timeout: Duration,
    /// How often shutdown re-checks outstanding locks while draining
    #[serde(with = "humantime_serde")]
    pub drain_interval: Duration,
    // Tables serialize after plain values
    pub tuning: TuningConfig,
}

impl CoordinatorConfig {
    pub fn new<I, S>(stores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stores: stores.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_tuning(mut self, tuning: TuningConfig) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.drain_interval = interval;
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(stores) = lookup(ENV_STORES) {
            // Blank entries are kept so validate() can name the missing slot
            self.stores = stores.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(value) = lookup(ENV_DRIFT_FACTOR) {
            self.tuning.drift_factor = parse_env(ENV_DRIFT_FACTOR, &value)?;
        }
        if let Some(value) = lookup(ENV_RETRY_COUNT) {
            self.tuning.retry_count = parse_env(ENV_RETRY_COUNT, &value)?;
        }
        if let Some(value) = lookup(ENV_RETRY_DELAY_MS) {
            self.tuning.retry_delay = Duration::from_millis(parse_env(ENV_RETRY_DELAY_MS, &value)?);
        }
        if let Some(value) = lookup(ENV_RETRY_JITTER_MS) {
            self.tuning.retry_jitter =
                Duration::from_millis(parse_env(ENV_RETRY_JITTER_MS, &value)?);
        }
        if let Some(value) = lookup(ENV_STORE_TIMEOUT_MS) {
            self.store_timeout = Duration::from_millis(parse_env(ENV_STORE_TIMEOUT_MS, &value)?);
        }
        Ok(self)
    }

    /// Check every store address and tuning value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stores.is_empty() {
            return Err(ConfigError::NoStores);
        }
        if let Some(index) = self.stores.iter().position(|a| a.trim().is_empty()) {
            return Err(ConfigError::MissingAddress { index });
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::StoreTimeout);
        }
        self.tuning.validate()
    }

    /// Number of acknowledgements needed for a majority
    pub fn quorum(&self) -> usize {
        self.stores.len() / 2 + 1
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            stores: Vec::new(),
            store_timeout: Duration::from_millis(500),
            drain_interval: Duration::from_millis(100),
            tuning: TuningConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
