//! Simulation runtime core - worker pool, barrier selection and the round
//! loop driving the scheduler policy.
//!
//! Round structure, per worker:
//! 1. report the minimum pending event time across its hosts,
//! 2. phase barrier; the leader reduces the reports and publishes either
//!    the next round barrier (`min + window`, capped at the stop time) or
//!    the shutdown sentinel,
//! 3. phase barrier; everyone reads the decision and drains `pop(barrier)`
//!    to exhaustion, executing each event through the caller's handler,
//! 4. phase barrier; a drained worker may still be pushed to by a peer's
//!    handler, so no next-round report happens until every drain loop has
//!    returned.
//!
//! Handlers may push follow-up events to any host during the drain phase;
//! inter-host pushes are delayed to the barrier by the policy, so nothing
//! published in round N executes before round N+1.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info};

use tidvakt_config::TidvaktConfig;
use tidvakt_core::events::Event;
use tidvakt_core::host::HostRef;
use tidvakt_core::time::SimulationTime;
use tidvakt_scheduler::SchedulerPolicy;
use tidvakt_telemetry::logging::EventLogger;
use tidvakt_telemetry::MetricsRecorder;

use crate::error::EngineError;

/// A host plus the events seeded into its queue before the first round.
pub struct HostWorkload {
    pub host: HostRef,
    pub initial_events: Vec<Event>,
}

impl HostWorkload {
    pub fn new(host: HostRef, initial_events: Vec<Event>) -> Self {
        Self {
            host,
            initial_events,
        }
    }
}

/// What a finished simulation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSummary {
    /// Rounds executed (barrier advances).
    pub rounds: u64,
    /// Events popped and handed to the handler.
    pub events_dispatched: u64,
    /// The last barrier reached, [`SimulationTime::ZERO`] if no round ran.
    pub end_time: SimulationTime,
}

/// Coordinates a fixed pool of worker threads over one scheduler policy.
pub struct Engine {
    config: TidvaktConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Engine {
    pub fn new(config: TidvaktConfig) -> Self {
        EventLogger::init(&config.telemetry.log_level);
        info!(
            workers = config.scheduler.workers,
            window_ns = config.scheduler.round.window_ns,
            "initializing simulation engine"
        );
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Run a simulation to completion.
    ///
    /// Hosts are assigned to workers round-robin and registered from each
    /// worker's own thread, so host-to-worker binding is real thread
    /// identity. `handler` executes every popped event and may push
    /// follow-ups through the policy it is handed.
    pub fn run<F>(
        &self,
        workload: Vec<HostWorkload>,
        handler: F,
    ) -> Result<SimulationSummary, EngineError>
    where
        F: Fn(&SchedulerPolicy, Event, SimulationTime) + Send + Sync,
    {
        let workers = self.config.scheduler.workers;
        if workers == 0 {
            return Err(EngineError::Validation(
                "worker count must be at least one".into(),
            ));
        }
        let window_ns = self.config.scheduler.round.window_ns;
        let stop_ns = self.config.scheduler.round.stop_time_ns;
        let metrics_enabled = self.config.telemetry.metrics_enabled;

        info!(workers, hosts = workload.len(), "starting simulation");

        // Fixed round-robin assignment, decided before any thread exists.
        let mut slices: Vec<Vec<HostWorkload>> = (0..workers).map(|_| Vec::new()).collect();
        for (index, item) in workload.into_iter().enumerate() {
            slices[index % workers].push(item);
        }

        // Workers register into the shared registry from their own
        // threads (binding hosts to their thread identity), then receive
        // the finalized policy over a channel once registration closes.
        let registry = Mutex::new(SchedulerPolicy::new());
        let registration_done = Barrier::new(workers + 1);
        let round_phase = Barrier::new(workers);

        let next_times: Vec<AtomicU64> = (0..workers).map(|_| AtomicU64::new(u64::MAX)).collect();
        let chosen_barrier = AtomicU64::new(0);
        let dispatched = AtomicU64::new(0);
        let rounds = AtomicU64::new(0);
        let end_time = AtomicU64::new(0);

        let mut shared_policy: Option<Arc<SchedulerPolicy>> = None;

        thread::scope(|scope| {
            let mut policy_senders = Vec::with_capacity(workers);
            for (index, slice) in slices.into_iter().enumerate() {
                let (sender, receiver) = crossbeam_channel::bounded::<Arc<SchedulerPolicy>>(1);
                policy_senders.push(sender);

                let registry = &registry;
                let registration_done = &registration_done;
                let round_phase = &round_phase;
                let next_times = &next_times;
                let chosen_barrier = &chosen_barrier;
                let dispatched = &dispatched;
                let rounds = &rounds;
                let end_time = &end_time;
                let handler = &handler;
                let metrics = &self.metrics;

                thread::Builder::new()
                    .name(format!("tidvakt-worker-{index}"))
                    .spawn_scoped(scope, move || {
                        {
                            let mut policy = registry.lock();
                            for item in &slice {
                                policy.add_host(&item.host, None);
                            }
                        }
                        registration_done.wait();

                        let policy = receiver.recv().expect("scheduler handle from engine");

                        // Seed initial events. Self-pushes keep their
                        // original timestamps.
                        for item in slice {
                            let HostWorkload {
                                host,
                                initial_events,
                            } = item;
                            for event in initial_events {
                                policy.push(event, &host, &host, SimulationTime::ZERO);
                            }
                        }

                        loop {
                            next_times[index].store(policy.next_time().nanos(), Ordering::SeqCst);

                            if round_phase.wait().is_leader() {
                                let min_next = next_times
                                    .iter()
                                    .map(|t| t.load(Ordering::SeqCst))
                                    .min()
                                    .unwrap_or(u64::MAX);

                                let barrier_ns = if min_next == u64::MAX || min_next >= stop_ns {
                                    u64::MAX
                                } else {
                                    min_next.saturating_add(window_ns).min(stop_ns)
                                };

                                if barrier_ns != u64::MAX {
                                    rounds.fetch_add(1, Ordering::Relaxed);
                                    end_time.store(barrier_ns, Ordering::SeqCst);
                                    debug!(barrier = barrier_ns, "advancing round barrier");
                                }
                                chosen_barrier.store(barrier_ns, Ordering::SeqCst);
                            }
                            round_phase.wait();

                            let barrier_ns = chosen_barrier.load(Ordering::SeqCst);
                            if barrier_ns == u64::MAX {
                                break;
                            }
                            let barrier = SimulationTime::from_nanos(barrier_ns);

                            let drain_started = Instant::now();
                            while let Some(event) = policy.pop(barrier) {
                                dispatched.fetch_add(1, Ordering::Relaxed);
                                handler(&policy, event, barrier);
                            }
                            if metrics_enabled {
                                metrics
                                    .round_duration
                                    .observe(drain_started.elapsed().as_secs_f64());
                            }

                            // A worker whose own queues ran dry is not done
                            // with the round: another worker's handler may
                            // still push into its queues. No next_time scan
                            // may start until every drain loop has returned.
                            round_phase.wait();
                        }
                    })
                    .expect("failed to spawn worker thread");
            }

            // Close registration and hand the finalized policy to every
            // worker; the maps are immutable from here on.
            registration_done.wait();
            let policy = Arc::new(std::mem::take(&mut *registry.lock()));
            debug!(hosts = policy.host_count(), "registration complete");
            for sender in &policy_senders {
                sender
                    .send(policy.clone())
                    .expect("worker alive at startup");
            }
            shared_policy = Some(policy);
        });

        let events_dispatched = dispatched.load(Ordering::Relaxed);
        if metrics_enabled {
            self.metrics
                .dispatched_events
                .inc_by(events_dispatched as f64);
            if let Some(policy) = &shared_policy {
                self.metrics
                    .causality_adjustments
                    .inc_by(policy.causality_adjustments() as f64);
            }
        }

        let summary = SimulationSummary {
            rounds: rounds.load(Ordering::Relaxed),
            events_dispatched,
            end_time: SimulationTime::from_nanos(end_time.load(Ordering::SeqCst)),
        };
        info!(
            rounds = summary.rounds,
            events = summary.events_dispatched,
            end = %summary.end_time,
            "simulation finished"
        );
        Ok(summary)
    }
}
