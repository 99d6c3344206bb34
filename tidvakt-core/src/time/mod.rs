//! ## tidvakt-core::time
//! **Virtual simulation and emulated clocks**
//!
//! Simulation time counts nanoseconds from simulation start and advances
//! only when the engine advances it, never from wall-clock observation.
//! Emulated time is the wall-clock-equivalent view of the same instant,
//! anchored at a fixed epoch.

use serde::{Deserialize, Serialize};

/// A point in simulation time: nanoseconds since simulation start.
///
/// `SimulationTime::MAX` is the "no event" sentinel. Ordinary `Ord`
/// ordering makes the sentinel compare greater than every real time, so
/// `min()` reductions over a set of next-event times do the right thing
/// without special cases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SimulationTime(u64);

impl SimulationTime {
    /// Simulation start.
    pub const ZERO: SimulationTime = SimulationTime(0);

    /// Sentinel meaning "no event pending".
    pub const MAX: SimulationTime = SimulationTime(u64::MAX);

    #[inline]
    pub const fn from_nanos(ns: u64) -> Self {
        SimulationTime(ns)
    }

    #[inline]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Whether this value is the "no event" sentinel.
    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.0 == u64::MAX
    }

    /// Advance by `ns`, returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, ns: u64) -> Option<SimulationTime> {
        self.0.checked_add(ns).map(SimulationTime)
    }

    /// Advance by `ns`, clamping at the sentinel on overflow.
    #[inline]
    pub fn saturating_add(self, ns: u64) -> SimulationTime {
        SimulationTime(self.0.saturating_add(ns))
    }
}

impl std::fmt::Display for SimulationTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_sentinel() {
            write!(f, "T=max")
        } else {
            write!(f, "T={}ns", self.0)
        }
    }
}

/// A point in emulated wall-clock time: nanoseconds since the Unix epoch
/// as observed by simulated hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmulatedTime(u64);

impl EmulatedTime {
    /// The emulated wall-clock instant at which every simulation begins
    /// (2000-01-01 00:00:00 UTC). All hosts observe this as "now" at
    /// simulation time zero.
    pub const SIMULATION_START: EmulatedTime = EmulatedTime(946_684_800_000_000_000);

    #[inline]
    pub const fn from_nanos_since_epoch(ns: u64) -> Self {
        EmulatedTime(ns)
    }

    #[inline]
    pub const fn nanos_since_epoch(self) -> u64 {
        self.0
    }

    /// The emulated instant corresponding to a simulation time.
    ///
    /// Returns `None` if `sim_time` is the sentinel or the sum overflows.
    #[inline]
    pub fn from_simulation_time(sim_time: SimulationTime) -> Option<EmulatedTime> {
        if sim_time.is_sentinel() {
            return None;
        }
        Self::SIMULATION_START
            .0
            .checked_add(sim_time.nanos())
            .map(EmulatedTime)
    }
}

impl std::fmt::Display for EmulatedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E={}ns", self.0)
    }
}
