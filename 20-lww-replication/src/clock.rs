//! Lamport logical clock shared by every request handler on a node.
//!
//! The clock is a single counter. Local writes advance it by one; inbound
//! replication advances it past the sender's timestamp. Both paths go through
//! atomic read-modify-write operations, so concurrent handlers never observe
//! or hand out the same reading twice.

use std::sync::atomic::{AtomicU64, Ordering};

/// Logical timestamp issued by a [`LamportClock`].
pub type Timestamp = u64;

/// Process-wide Lamport counter owned by one node.
///
/// Starts at zero. Every event it processes yields a strictly larger value
/// than anything it returned before.
#[derive(Debug, Default)]
pub struct LamportClock {
    counter: AtomicU64,
}

impl LamportClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock that already reads `value`.
    pub fn starting_at(value: Timestamp) -> Self {
        Self {
            counter: AtomicU64::new(value),
        }
    }

    /// Advances the clock for a locally originated event and returns the new reading.
    pub fn tick_local(&self) -> Timestamp {
        self.advance(|current| current.saturating_add(1))
    }

    /// Applies the Lamport receive rule: `counter = max(counter, remote) + 1`.
    ///
    /// Returns the new reading, which is strictly greater than both the
    /// previous local value and `remote` for any `remote < Timestamp::MAX`.
    pub fn on_receive(&self, remote: Timestamp) -> Timestamp {
        self.advance(|current| current.max(remote).saturating_add(1))
    }

    /// Atomically replaces the counter with `next(counter)` and returns the new value.
    ///
    /// Readings saturate at `Timestamp::MAX`; past that point the clock stops advancing.
    fn advance(&self, next: impl Fn(Timestamp) -> Timestamp) -> Timestamp {
        let previous = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(next(current))
            })
            .unwrap_or_else(|current| current);
        next(previous)
    }

    /// Current reading. Does not advance the clock.
    pub fn read(&self) -> Timestamp {
        self.counter.load(Ordering::SeqCst)
    }
}
