//! # tidvakt-scheduler
//!
//! The per-host parallel scheduler policy at the heart of the tidvakt
//! simulator. Worker threads own disjoint sets of hosts; each worker drains
//! one host's due events completely before moving to the next (locality),
//! a two-partition rotation guarantees every host is visited each round,
//! and inter-host events are delayed to the round barrier so causality
//! survives parallel execution.
//!
//! ### Key Submodules:
//! - `worker`: worker identity and the per-worker round bookkeeping
//! - `policy`: the host/worker/queue registry and its scheduling operations
//!
//! The crate has no thread pool of its own: the engine creates the workers,
//! synchronizes round boundaries, and calls into the policy from them.

pub mod policy;
pub mod worker;

pub use policy::SchedulerPolicy;
pub use worker::WorkerId;
