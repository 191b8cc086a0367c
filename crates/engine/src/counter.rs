// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outstanding-lock accounting per resource
//!
//! Each successful acquisition takes a [`CounterHold`]; dropping the hold
//! gives the count back. Entries are created on first acquisition and kept at
//! zero afterwards, so the key set only grows for the life of one counter.

use fence_core::ResourceId;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct LockCounter {
    entries: Mutex<HashMap<ResourceId, Arc<AtomicUsize>>>,
}

impl LockCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more hold on `resource` until the returned guard drops
    pub fn hold(&self, resource: &ResourceId) -> CounterHold {
        let count = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(entries.entry(resource.clone()).or_default())
        };
        count.fetch_add(1, Ordering::AcqRel);
        CounterHold {
            resource: resource.clone(),
            count,
        }
    }

    /// Holds currently outstanding on `resource`
    pub fn get(&self, resource: &str) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(resource)
            .map_or(0, |count| count.load(Ordering::Acquire))
    }

    /// Holds outstanding across every resource
    pub fn total(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().map(|c| c.load(Ordering::Acquire)).sum()
    }

    pub fn is_idle(&self) -> bool {
        self.total() == 0
    }

    /// Distinct resources ever held through this counter
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> BTreeMap<String, usize> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .map(|(id, count)| (id.to_string(), count.load(Ordering::Acquire)))
            .collect()
    }
}

/// One outstanding hold; decrements its entry exactly once, on drop
#[derive(Debug)]
pub struct CounterHold {
    resource: ResourceId,
    count: Arc<AtomicUsize>,
}

impl CounterHold {
    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }
}

impl Drop for CounterHold {
    fn drop(&mut self) {
        let result = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if result.is_err() {
            // Unreachable while holds are the only decrement path
            tracing::error!(resource = %self.resource, "lock counter underflow prevented");
        }
    }
}

#[cfg(test)]
#[path = "counter_tests.rs"]
mod tests;
