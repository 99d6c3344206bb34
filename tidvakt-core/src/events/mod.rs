//! ## tidvakt-core::events
//! **Opaque timestamped event payloads**
//!
//! An event is a work item addressed to a host at a simulation time. The
//! payload is an immutable zero-copy buffer whose meaning belongs entirely
//! to the code that executes the event; the scheduler only reads and (under
//! the causality rule) rewrites the timestamp.

use bytes::Bytes;

use crate::host::HostRef;
use crate::time::SimulationTime;

/// A timestamped work item delivered to a host.
#[derive(Clone, Debug)]
pub struct Event {
    time: SimulationTime,
    host: HostRef,
    payload: Bytes,
}

impl Event {
    /// Create an event addressed to `host` at `time`.
    #[inline]
    pub fn new(time: SimulationTime, host: HostRef, payload: Bytes) -> Self {
        Self {
            time,
            host,
            payload,
        }
    }

    /// The simulation time at which this event is due.
    #[inline]
    pub fn time(&self) -> SimulationTime {
        self.time
    }

    /// Rewrite the due time. Only the scheduler's causality rule should
    /// move an event's time once it has been handed over for delivery.
    #[inline]
    pub fn set_time(&mut self, time: SimulationTime) {
        self.time = time;
    }

    /// The destination host.
    #[inline]
    pub fn host(&self) -> &HostRef {
        &self.host
    }

    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}
