//! ## tidvakt-core::queue
//! **Thread-safe per-host event queue**
//!
//! A concurrent priority queue ordered by event simulation time, ascending,
//! with FIFO tie-breaking for equal times. Any worker may push; only the
//! owning worker pops, and only events strictly before the round barrier
//! are eligible. Events exactly at the barrier stay queued for the next
//! round (barrier exclusion).
//!
//! The queue's mutex is the only suspension point: it covers O(log n) heap
//! work and nothing else.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use parking_lot::Mutex;

use crate::events::Event;
use crate::time::SimulationTime;

/// Heap entry keyed by `(time, seq)`. The sequence number is assigned at
/// push under the queue lock, which both linearizes concurrent pushes and
/// gives equal-time events FIFO order.
struct Scheduled {
    time: SimulationTime,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, self.seq).cmp(&(other.time, other.seq))
    }
}

struct Inner {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

/// A per-host event queue: min-heap on event time behind a mutex.
pub struct EventQueue {
    inner: Mutex<Inner>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Insert an event. O(log n); never fails.
    pub fn push(&self, event: Event) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.heap.push(Reverse(Scheduled {
            time: event.time(),
            seq,
            event,
        }));
    }

    /// Remove and return the earliest event iff its time is strictly less
    /// than `barrier`. Atomic with respect to concurrent pushes.
    pub fn pop_if_before(&self, barrier: SimulationTime) -> Option<Event> {
        let mut inner = self.inner.lock();
        let due = matches!(inner.heap.peek(), Some(Reverse(head)) if head.time < barrier);
        if due {
            inner.heap.pop().map(|Reverse(entry)| entry.event)
        } else {
            None
        }
    }

    /// The earliest pending event time, or `None` if the queue is empty.
    ///
    /// This is a snapshot: it may be stale the instant after it is read.
    /// Callers only compare it against a barrier they themselves control.
    pub fn next_event_time(&self) -> Option<SimulationTime> {
        self.inner.lock().heap.peek().map(|Reverse(head)| head.time)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
