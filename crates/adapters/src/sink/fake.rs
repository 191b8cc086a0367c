// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording error sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ErrorSink, StoreEvent, StoreOperation};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct FakeErrorSink {
    events: Arc<Mutex<Vec<StoreEvent>>>,
}

impl FakeErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reported events, oldest first
    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of reported events for `operation`
    pub fn count(&self, operation: StoreOperation) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|event| event.operation == operation)
            .count()
    }
}

impl ErrorSink for FakeErrorSink {
    fn report(&self, event: &StoreEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}
