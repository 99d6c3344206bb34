//! # tidvakt-engine
//!
//! The outer simulation engine: owns the worker pool, assigns hosts,
//! chooses round barriers from the workers' next-event reports and drives
//! the scheduler policy until the simulation runs dry or reaches its stop
//! time.
//!
//! The scheduler policy itself provides no synchronization between rounds;
//! this crate supplies it, with one phase barrier separating the
//! barrier-selection scan from the drain phase of each round.

mod error;
mod runtime;

pub use error::EngineError;
pub use runtime::{Engine, HostWorkload, SimulationSummary};
