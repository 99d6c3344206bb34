//! The host/worker/queue registry and its scheduling operations.
//!
//! `SchedulerPolicy` owns one event queue per host and one round state per
//! worker. Registration is a single-threaded prologue; afterwards the maps
//! are read-only and every mutation happens behind a per-queue or
//! per-worker mutex, so workers never contend on anything but the queues
//! they actually share.
//!
//! Lock order is worker-state then queue; queues never acquire another
//! scheduler lock, so the pair cannot deadlock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use tidvakt_core::events::Event;
use tidvakt_core::host::HostRef;
use tidvakt_core::queue::EventQueue;
use tidvakt_core::time::{EmulatedTime, SimulationTime};

use crate::worker::{WorkerId, WorkerState};

/// The per-host parallel scheduler policy.
///
/// Workers call [`pop`](Self::pop) for their own workload and may
/// [`push`](Self::push) to any host. The engine computes round barriers
/// from [`next_time`](Self::next_time) and globally synchronizes barrier
/// advancement; the policy itself provides no barrier primitive.
#[derive(Default)]
pub struct SchedulerPolicy {
    /// One event queue per registered host.
    host_queues: HashMap<HostRef, EventQueue>,
    /// Round bookkeeping per worker thread.
    worker_states: HashMap<WorkerId, Mutex<WorkerState>>,
    /// Fixed host-to-worker assignment, set at registration.
    host_workers: HashMap<HostRef, WorkerId>,
    /// Inter-host events delayed by the causality rule, for telemetry.
    causality_adjustments: AtomicU64,
}

impl SchedulerPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `host` and assign it to `worker`, or to the calling thread
    /// when no worker is given.
    ///
    /// Must run before workers start popping, or otherwise be externally
    /// serialized. A host must be registered exactly once: re-registering
    /// reuses the existing queue but would duplicate the host in a
    /// worker's round list.
    pub fn add_host(&mut self, host: &HostRef, worker: Option<WorkerId>) {
        self.host_queues
            .entry(host.clone())
            .or_insert_with(EventQueue::new);

        let worker = worker.unwrap_or_else(WorkerId::current);
        self.worker_states
            .entry(worker)
            .or_insert_with(|| Mutex::new(WorkerState::new()))
            .get_mut()
            .assign(host.clone());

        self.host_workers.insert(host.clone(), worker);
        debug!(host = %host, "registered host");
    }

    /// Deliver `event` to `dst`'s queue, returning the effective event time.
    ///
    /// A worker drains one host completely before moving on, so an event
    /// another host produced with a time inside the current round could
    /// arrive at a destination whose own clock already passed it. Delaying
    /// every inter-host event to the barrier is the minimum adjustment
    /// that keeps it invisible until the next round; self-deliveries keep
    /// their original timestamp.
    ///
    /// # Panics
    /// If `dst` was never registered.
    pub fn push(
        &self,
        mut event: Event,
        src: &HostRef,
        dst: &HostRef,
        barrier: SimulationTime,
    ) -> SimulationTime {
        debug_assert_eq!(
            event.host(),
            dst,
            "event addressed to a different host than its destination queue"
        );

        if src != dst && event.time() < barrier {
            debug!(
                src = %src,
                dst = %dst,
                original = %event.time(),
                adjusted = %barrier,
                "delaying inter-host event to preserve causality"
            );
            event.set_time(barrier);
            self.causality_adjustments.fetch_add(1, Ordering::Relaxed);
        }

        let queue = self
            .host_queues
            .get(dst)
            .unwrap_or_else(|| panic!("push to unregistered host '{dst}'"));

        let effective = event.time();
        queue.push(event);
        effective
    }

    /// Pop the next due event for the calling worker, or `None` once every
    /// host assigned to it is drained up to `barrier`.
    ///
    /// A barrier larger than the worker's current one starts a new round,
    /// rotating all hosts back into the work-list. Within a round the head
    /// host is drained completely before the next host is considered.
    pub fn pop(&self, barrier: SimulationTime) -> Option<Event> {
        // A worker that was never assigned a host simply stays idle.
        let state = self.worker_states.get(&WorkerId::current())?;
        let mut state = state.lock();

        state.observe_barrier(barrier);

        while let Some(host) = state.head_host() {
            let queue = self
                .host_queues
                .get(host)
                .unwrap_or_else(|| panic!("scheduler invariant: host '{host}' has no queue"));

            if let Some(event) = queue.pop_if_before(barrier) {
                // Leave the host at the head so the next pop keeps
                // draining it.
                return Some(event);
            }
            state.retire_head();
        }

        None
    }

    /// The next pending event time for `host`, as emulated time, or `None`
    /// if its queue is empty.
    ///
    /// # Panics
    /// If `host` was never registered.
    pub fn next_host_event_time(&self, host: &HostRef) -> Option<EmulatedTime> {
        let queue = self
            .host_queues
            .get(host)
            .unwrap_or_else(|| panic!("next event time queried for unregistered host '{host}'"));

        queue.next_event_time().and_then(EmulatedTime::from_simulation_time)
    }

    /// The minimum pending event time across every host assigned to the
    /// calling worker, or the sentinel [`SimulationTime::MAX`] when none
    /// has events. Read-only; used by the engine to choose the next
    /// barrier at quiescent points.
    pub fn next_time(&self) -> SimulationTime {
        let Some(state) = self.worker_states.get(&WorkerId::current()) else {
            return SimulationTime::MAX;
        };
        let state = state.lock();

        let next = state
            .hosts()
            .filter_map(|host| {
                self.host_queues
                    .get(host)
                    .unwrap_or_else(|| {
                        panic!("scheduler invariant: host '{host}' has no queue")
                    })
                    .next_event_time()
            })
            .min()
            .unwrap_or(SimulationTime::MAX);

        debug!(next = %next, "next event for worker");
        next
    }

    /// The hosts assigned to the calling worker, processed partition
    /// first. The returned snapshot is valid only until the next
    /// scheduler call.
    pub fn assigned_hosts(&self) -> Vec<HostRef> {
        match self.worker_states.get(&WorkerId::current()) {
            Some(state) => state.lock().assigned_hosts(),
            None => Vec::new(),
        }
    }

    /// The worker a host was assigned to, if registered.
    pub fn worker_for(&self, host: &HostRef) -> Option<WorkerId> {
        self.host_workers.get(host).copied()
    }

    /// Number of registered hosts.
    pub fn host_count(&self) -> usize {
        self.host_queues.len()
    }

    /// How many inter-host events have been delayed to a barrier so far.
    pub fn causality_adjustments(&self) -> u64 {
        self.causality_adjustments.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tidvakt_core::host::Host;

    fn time(ns: u64) -> SimulationTime {
        SimulationTime::from_nanos(ns)
    }

    fn event(host: &HostRef, at: u64) -> Event {
        Event::new(time(at), host.clone(), Bytes::from_static(b"payload"))
    }

    #[test]
    fn self_event_keeps_original_time() {
        let h = Host::new("h");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h, None);

        let effective = policy.push(event(&h, 5), &h, &h, time(10));
        assert_eq!(effective, time(5));

        let popped = policy.pop(time(10)).expect("event due before barrier");
        assert_eq!(popped.time(), time(5));
        assert_eq!(policy.causality_adjustments(), 0);
    }

    #[test]
    fn cross_host_event_is_delayed_to_barrier() {
        use std::sync::mpsc;
        use std::sync::Arc;

        let h1 = Host::new("h1");
        let h2 = Host::new("h2");

        let (id_tx, id_rx) = mpsc::channel();
        let (policy_tx, policy_rx) = mpsc::channel::<Arc<SchedulerPolicy>>();

        let worker2 = {
            let h2 = h2.clone();
            std::thread::spawn(move || {
                id_tx.send(WorkerId::current()).unwrap();
                let policy = policy_rx.recv().unwrap();

                // Not visible within the round it was pushed in.
                assert!(policy.pop(time(10)).is_none());
                // Released by the next round.
                let popped = policy.pop(time(20)).expect("due in next round");
                assert_eq!(popped.time(), time(10));
                assert_eq!(popped.host(), &h2);
            })
        };

        // Registration: h1 on this thread, h2 on the spawned worker.
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h1, None);
        let w2 = id_rx.recv().unwrap();
        policy.add_host(&h2, Some(w2));
        assert_eq!(policy.worker_for(&h2), Some(w2));

        // Cross-worker, cross-host push from this worker: the timestamp
        // is rewritten to the barrier.
        let policy = Arc::new(policy);
        let effective = policy.push(event(&h2, 3), &h1, &h2, time(10));
        assert_eq!(effective, time(10));

        policy_tx.send(policy.clone()).unwrap();
        worker2.join().unwrap();

        assert_eq!(policy.causality_adjustments(), 1);
    }

    #[test]
    fn locality_drains_one_host_in_time_order() {
        let h = Host::new("h");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h, None);

        for at in [1, 2, 3] {
            policy.push(event(&h, at), &h, &h, time(0));
        }

        let barrier = time(100);
        assert_eq!(policy.pop(barrier).unwrap().time(), time(1));
        assert_eq!(policy.pop(barrier).unwrap().time(), time(2));
        assert_eq!(policy.pop(barrier).unwrap().time(), time(3));
        assert!(policy.pop(barrier).is_none());
    }

    #[test]
    fn exhausted_pop_is_idempotent() {
        let h = Host::new("h");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h, None);
        policy.push(event(&h, 1), &h, &h, time(0));

        let barrier = time(10);
        assert!(policy.pop(barrier).is_some());
        assert!(policy.pop(barrier).is_none());
        assert!(policy.pop(barrier).is_none());
    }

    #[test]
    fn round_rotation_revisits_drained_hosts() {
        let h1 = Host::new("h1");
        let h2 = Host::new("h2");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h1, None);
        policy.add_host(&h2, None);

        policy.push(event(&h1, 1), &h1, &h1, time(0));
        assert_eq!(policy.pop(time(10)).unwrap().time(), time(1));
        assert!(policy.pop(time(10)).is_none());

        // h1 is now in the processed partition; a later event must still
        // reach it once the next round rotates it back.
        policy.push(event(&h1, 15), &h1, &h1, time(10));
        let popped = policy.pop(time(20)).expect("rotated back in");
        assert_eq!(popped.time(), time(15));
    }

    #[test]
    fn next_time_is_a_pure_query() {
        let h1 = Host::new("h1");
        let h2 = Host::new("h2");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h1, None);
        policy.add_host(&h2, None);

        policy.push(event(&h1, 7), &h1, &h1, time(0));
        policy.push(event(&h2, 4), &h2, &h2, time(0));

        assert_eq!(policy.next_time(), time(4));

        // A pop attempt below every event time consumes nothing.
        assert!(policy.pop(time(3)).is_none());
        assert_eq!(policy.next_time(), time(4));
        assert_eq!(policy.next_time(), time(4));
    }

    #[test]
    fn event_at_barrier_waits_for_the_next_round() {
        let h = Host::new("h");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h, None);
        policy.push(event(&h, 10), &h, &h, time(0));

        assert!(policy.pop(time(10)).is_none());
        assert_eq!(policy.pop(time(11)).unwrap().time(), time(10));
    }

    #[test]
    fn worker_without_hosts_idles_cleanly() {
        let policy = SchedulerPolicy::new();
        assert!(policy.pop(time(10)).is_none());
        assert_eq!(policy.next_time(), SimulationTime::MAX);
        assert!(policy.assigned_hosts().is_empty());
    }

    #[test]
    fn next_time_scans_processed_hosts_too() {
        let h = Host::new("h");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h, None);

        policy.push(event(&h, 1), &h, &h, time(0));
        assert!(policy.pop(time(10)).is_some());
        assert!(policy.pop(time(10)).is_none());

        // h sits in the processed partition now; its queue still counts.
        policy.push(event(&h, 30), &h, &h, time(10));
        assert_eq!(policy.next_time(), time(30));
    }

    #[test]
    fn next_host_event_time_translates_to_emulated() {
        let h = Host::new("h");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h, None);

        assert!(policy.next_host_event_time(&h).is_none());

        policy.push(event(&h, 9), &h, &h, time(0));
        let emulated = policy.next_host_event_time(&h).unwrap();
        assert_eq!(
            emulated.nanos_since_epoch(),
            EmulatedTime::SIMULATION_START.nanos_since_epoch() + 9
        );
    }

    #[test]
    fn assigned_hosts_lists_every_partition_once() {
        let h1 = Host::new("h1");
        let h2 = Host::new("h2");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h1, None);
        policy.add_host(&h2, None);

        policy.push(event(&h1, 1), &h1, &h1, time(0));
        assert!(policy.pop(time(5)).is_some());
        assert!(policy.pop(time(5)).is_none());

        let hosts = policy.assigned_hosts();
        assert_eq!(hosts.len(), 2);
        assert!(hosts.contains(&h1));
        assert!(hosts.contains(&h2));
    }

    #[test]
    #[should_panic(expected = "unregistered host")]
    fn push_to_unregistered_host_is_fatal() {
        let h = Host::new("h");
        let stranger = Host::new("stranger");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h, None);
        policy.push(event(&stranger, 1), &h, &stranger, time(0));
    }

    #[test]
    fn worker_assignment_is_recorded() {
        let h = Host::new("h");
        let mut policy = SchedulerPolicy::new();
        policy.add_host(&h, None);
        assert_eq!(policy.worker_for(&h), Some(WorkerId::current()));
        assert_eq!(policy.host_count(), 1);
    }
}
