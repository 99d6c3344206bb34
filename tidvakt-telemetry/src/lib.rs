//! # tidvakt-telemetry
//!
//! Observability for the tidvakt simulator.
//!
//! ### Components:
//! - `logging`: tracing subscriber setup with per-thread worker names
//! - `metrics`: Prometheus counters for dispatch and causality activity

pub mod logging;
pub mod metrics;

pub use metrics::MetricsRecorder;
