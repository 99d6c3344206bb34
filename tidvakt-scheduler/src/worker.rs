//! Worker identity and per-worker round bookkeeping.
//!
//! Each worker tracks its assigned hosts in two ordered partitions:
//! `unprocessed` is the work-list for the current round, `processed`
//! accumulates hosts whose queues have been drained up to the barrier.
//! Observing a larger barrier rotates every host back into `unprocessed`.

use std::collections::VecDeque;
use std::thread::{self, ThreadId};

use tidvakt_core::host::HostRef;
use tidvakt_core::time::SimulationTime;

/// Stable identifier of a worker thread.
///
/// Workers are keyed by their own thread identity; a host assigned to a
/// worker at registration stays with that thread for its whole lifetime,
/// so a captured `WorkerId` never goes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(ThreadId);

impl WorkerId {
    /// The identity of the calling thread.
    pub fn current() -> Self {
        WorkerId(thread::current().id())
    }
}

/// Round bookkeeping for one worker. Mutated only through the policy, by
/// the owning worker (the engine schedules the read-only `next_time` scans
/// at quiescent points between rounds).
#[derive(Debug)]
pub(crate) struct WorkerState {
    /// Hosts not yet drained this round, in processing order.
    unprocessed: VecDeque<HostRef>,
    /// Hosts already drained this round.
    processed: VecDeque<HostRef>,
    /// Materialized `processed ++ unprocessed`, rebuilt on demand when both
    /// partitions are non-empty.
    all_hosts: Option<Vec<HostRef>>,
    /// Highest barrier observed by this worker; the round marker.
    current_barrier: SimulationTime,
}

impl WorkerState {
    pub(crate) fn new() -> Self {
        Self {
            unprocessed: VecDeque::new(),
            processed: VecDeque::new(),
            all_hosts: None,
            current_barrier: SimulationTime::ZERO,
        }
    }

    /// Append a newly registered host to this round's work-list.
    pub(crate) fn assign(&mut self, host: HostRef) {
        self.all_hosts = None;
        self.unprocessed.push_back(host);
    }

    /// Observe a barrier. A strictly larger value starts a new round:
    /// every processed host rotates back into `unprocessed`.
    pub(crate) fn observe_barrier(&mut self, barrier: SimulationTime) {
        if barrier <= self.current_barrier {
            return;
        }
        self.current_barrier = barrier;
        self.all_hosts = None;

        if self.unprocessed.is_empty() {
            // Common case between rounds: O(1) swap.
            std::mem::swap(&mut self.unprocessed, &mut self.processed);
        } else {
            while let Some(host) = self.processed.pop_front() {
                self.unprocessed.push_back(host);
            }
        }
    }

    /// The host currently at the head of the round's work-list.
    pub(crate) fn head_host(&self) -> Option<&HostRef> {
        self.unprocessed.front()
    }

    /// Move the head host to the processed partition.
    pub(crate) fn retire_head(&mut self) {
        self.all_hosts = None;
        if let Some(host) = self.unprocessed.pop_front() {
            self.processed.push_back(host);
        }
    }

    /// Iterate every host assigned to this worker, both partitions.
    pub(crate) fn hosts(&self) -> impl Iterator<Item = &HostRef> {
        self.unprocessed.iter().chain(self.processed.iter())
    }

    /// Snapshot of the assigned hosts, `processed` before `unprocessed`.
    ///
    /// When one partition is empty this is a straight copy of the other;
    /// otherwise the concatenation is cached until the partitions change.
    pub(crate) fn assigned_hosts(&mut self) -> Vec<HostRef> {
        if self.unprocessed.is_empty() {
            return self.processed.iter().cloned().collect();
        }
        if self.processed.is_empty() {
            return self.unprocessed.iter().cloned().collect();
        }
        let all = self.all_hosts.get_or_insert_with(|| {
            self.processed
                .iter()
                .chain(self.unprocessed.iter())
                .cloned()
                .collect()
        });
        all.clone()
    }

    #[cfg(test)]
    pub(crate) fn partition_lens(&self) -> (usize, usize) {
        (self.unprocessed.len(), self.processed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidvakt_core::host::Host;

    fn barrier(ns: u64) -> SimulationTime {
        SimulationTime::from_nanos(ns)
    }

    #[test]
    fn worker_id_is_stable_within_a_thread() {
        assert_eq!(WorkerId::current(), WorkerId::current());
        let other = std::thread::spawn(WorkerId::current).join().unwrap();
        assert_ne!(WorkerId::current(), other);
    }

    #[test]
    fn new_barrier_rotates_processed_hosts_back() {
        let mut state = WorkerState::new();
        state.assign(Host::new("a"));
        state.assign(Host::new("b"));
        state.observe_barrier(barrier(10));

        state.retire_head();
        state.retire_head();
        assert_eq!(state.partition_lens(), (0, 2));

        // Same barrier: no rotation.
        state.observe_barrier(barrier(10));
        assert_eq!(state.partition_lens(), (0, 2));

        // Larger barrier: everything is unprocessed again.
        state.observe_barrier(barrier(20));
        assert_eq!(state.partition_lens(), (2, 0));
    }

    #[test]
    fn rotation_preserves_processing_order() {
        let a = Host::new("a");
        let b = Host::new("b");
        let c = Host::new("c");
        let mut state = WorkerState::new();
        state.assign(a.clone());
        state.assign(b.clone());
        state.assign(c.clone());
        state.observe_barrier(barrier(1));

        // Drain a and b, leave c unprocessed, then start a new round: the
        // fallback path appends processed hosts behind the remainder.
        state.retire_head();
        state.retire_head();
        state.observe_barrier(barrier(2));

        let order: Vec<_> = state.hosts().cloned().collect();
        assert_eq!(order, vec![c, a, b]);
    }

    #[test]
    fn assigned_hosts_concatenates_processed_first() {
        let a = Host::new("a");
        let b = Host::new("b");
        let mut state = WorkerState::new();
        state.assign(a.clone());
        state.assign(b.clone());

        // Only unprocessed: direct copy.
        assert_eq!(state.assigned_hosts(), vec![a.clone(), b.clone()]);

        state.observe_barrier(barrier(5));
        state.retire_head();
        // Both partitions populated: processed then unprocessed.
        assert_eq!(state.assigned_hosts(), vec![a.clone(), b.clone()]);

        state.retire_head();
        // Only processed: direct copy.
        assert_eq!(state.assigned_hosts(), vec![a, b]);
    }
}
