// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::model::ProcessedRecord;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

pub const DEFAULT_CAPACITY: usize = 100;

/// A bounded, in-memory record of the most recently processed messages.
///
/// Inserting into a full buffer evicts the oldest record. Appends and
/// snapshots take the same lock, so readers never observe a partially
/// evicted buffer.
#[derive(Debug)]
pub struct RecentMessages {
    capacity: usize,
    records: Mutex<VecDeque<ProcessedRecord>>,
}

impl RecentMessages {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Appends a record, evicting the oldest record if the buffer is full.
    pub fn push(&self, record: ProcessedRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.lock();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Returns a copy of the buffer contents, oldest first.
    pub fn snapshot(&self) -> Vec<ProcessedRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave the deque in an invalid
    // state, so recover the guard instead of propagating the poison.
    fn lock(&self) -> MutexGuard<'_, VecDeque<ProcessedRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RecentMessages {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
