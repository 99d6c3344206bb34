//! Scheduler and round-window configuration.
//!
//! Parameters for the worker pool and the barrier selection loop:
//! - Worker thread count (hosts are assigned round-robin at startup)
//! - Execution window width and simulation stop time

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Worker pool and round parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SchedulerConfig {
    /// Number of worker threads. Each worker owns a disjoint set of hosts
    /// for the whole simulation.
    #[serde(default = "default_workers")]
    #[validate(range(min = 1, max = 1024))]
    pub workers: usize,

    /// Round-window parameters driving barrier selection.
    #[validate(nested)]
    #[serde(default)]
    pub round: RoundConfig,
}

fn default_workers() -> usize {
    num_cpus::get()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            round: RoundConfig::default(),
        }
    }
}

/// Parameters of the barrier selection loop.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
#[validate(schema(function = validation::validate_round_bounds))]
pub struct RoundConfig {
    /// Width of each execution window in simulated nanoseconds: the next
    /// barrier is the minimum pending event time plus this window.
    #[serde(default = "default_window_ns")]
    #[validate(range(min = 1))]
    pub window_ns: u64,

    /// Simulation end, in nanoseconds of simulated time.
    #[serde(default = "default_stop_time_ns")]
    #[validate(range(min = 1))]
    pub stop_time_ns: u64,
}

fn default_window_ns() -> u64 {
    1_000_000 // 1ms of simulated time per round.
}

fn default_stop_time_ns() -> u64 {
    1_000_000_000 // 1s of simulated time.
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            window_ns: default_window_ns(),
            stop_time_ns: default_stop_time_ns(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_validates() {
        RoundConfig::default().validate().unwrap();
    }

    #[test]
    fn stop_time_must_cover_one_window() {
        let round = RoundConfig {
            window_ns: 100,
            stop_time_ns: 50,
        };
        assert!(round.validate().is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = SchedulerConfig {
            workers: 0,
            round: RoundConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}
