// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing errors with context and suggestions

use fence_core::ConfigError;
use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for display on stderr
#[derive(Debug)]
pub struct FenceError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// No store addresses in any configuration source
    pub fn no_stores() -> Self {
        FenceError::new("no lock stores configured")
            .with_context("neither --config, FENCE_STORES, nor --store named a store")
            .with_suggestion("Pass a store: fence --store file:///var/lib/fence run ...")
            .with_suggestion("Set FENCE_STORES=file:///mnt/a/fence,file:///mnt/b/fence,file:///mnt/c/fence")
    }

    pub fn config_unreadable(path: &Path, error: ConfigError) -> Self {
        FenceError::new(format!("cannot load {}", path.display()))
            .with_context(error.to_string())
            .with_suggestion("Print the defaults with: fence --store file:///var/lib/fence config")
            .with_source(error)
    }
}

impl fmt::Display for FenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for FenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
