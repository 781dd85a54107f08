//! In-memory last-writer-wins register store.
//!
//! Every key holds exactly one [`Entry`]. A candidate write replaces the
//! current entry only if its `(ts, origin)` pair ranks higher, so any two
//! nodes that have seen the same writes for a key end up with the same entry
//! no matter the order those writes arrived in.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::Timestamp;

/// The winning write for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Opaque client value, never interpreted.
    pub value: Value,
    /// Lamport reading assigned by the origin node.
    pub ts: Timestamp,
    /// Identifier of the node that accepted the write from a client.
    pub origin: String,
}

impl Entry {
    pub fn new(value: Value, ts: Timestamp, origin: impl Into<String>) -> Self {
        Self {
            value,
            ts,
            origin: origin.into(),
        }
    }

    /// Total order used to pick a winner: timestamp first, origin breaks ties.
    pub fn rank(&self, ts: Timestamp, origin: &str) -> Ordering {
        self.ts
            .cmp(&ts)
            .then_with(|| self.origin.as_str().cmp(origin))
    }
}

/// Thread-safe key to [`Entry`] map guarded by the LWW rule.
///
/// A single `Mutex` serializes every check-and-set; the critical sections are
/// a map lookup and at most one insert. `BTreeMap` keeps snapshots sorted by key.
#[derive(Debug, Default)]
pub struct LwwStore {
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl LwwStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a write to the store.
    ///
    /// Returns `true` if the key was absent or the candidate outranks the
    /// current entry, in which case the entry is replaced. Re-applying the
    /// exact same `(ts, origin)` is a no-op and returns `false`.
    pub fn apply(&self, key: &str, value: Value, ts: Timestamp, origin: &str) -> bool {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        match entries.get(key) {
            Some(current) if current.rank(ts, origin) != Ordering::Less => false,
            _ => {
                entries.insert(key.to_string(), Entry::new(value, ts, origin));
                true
            }
        }
    }

    /// Point read of the current winner for `key`.
    pub fn get(&self, key: &str) -> Option<Entry> {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned()
    }

    /// Consistent copy of every entry, taken under one lock acquisition.
    pub fn snapshot(&self) -> BTreeMap<String, Entry> {
        self.entries.lock().expect("store lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
