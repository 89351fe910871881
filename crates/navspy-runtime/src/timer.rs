#![forbid(unsafe_code)]

//! Cancelable one-shot timers on a host-driven clock.
//!
//! The queue never reads a real clock. Callers pass the current monotonic
//! time to [`TimerQueue::pop_due`] and receive every timer whose deadline
//! has been reached, ordered by deadline and then by scheduling order.
//!
//! # Invariants
//!
//! 1. A cancelled timer is never returned.
//! 2. Timers with equal deadlines fire in the order they were scheduled.
//! 3. `TimerId`s are unique for the lifetime of a queue.

use core::cmp::{Ordering, Reverse};
use core::time::Duration;
use std::collections::BinaryHeap;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<K> {
    deadline: Duration,
    id: TimerId,
    payload: K,
}

impl<K> PartialEq for Entry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl<K> Eq for Entry<K> {}

impl<K> PartialOrd for Entry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Entry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A min-heap of one-shot timers carrying a payload of type `K`.
#[derive(Debug)]
pub struct TimerQueue<K> {
    heap: BinaryHeap<Reverse<Entry<K>>>,
    next_id: u64,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TimerQueue<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_id: 0,
        }
    }

    /// Schedule `payload` to fire at `deadline`.
    pub fn schedule(&mut self, deadline: Duration, payload: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Entry {
            deadline,
            id,
            payload,
        }));
        id
    }

    /// Cancel a timer. Returns `true` if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.heap.len();
        self.heap.retain(|Reverse(entry)| entry.id != id);
        self.heap.len() != before
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn pop_due(&mut self, now: Duration) -> Vec<(TimerId, K)> {
        let mut due = Vec::new();
        while self
            .heap
            .peek()
            .is_some_and(|Reverse(entry)| entry.deadline <= now)
        {
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push((entry.id, entry.payload));
            }
        }
        due
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(entry)| entry.deadline)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
