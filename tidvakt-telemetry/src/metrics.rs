//! Prometheus metrics for the scheduler.

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

/// Counters and histograms describing one simulation run.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub dispatched_events: Counter,
    pub causality_adjustments: Counter,
    pub round_duration: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let dispatched_events = Counter::new(
            "tidvakt_dispatched_events_total",
            "Events popped and executed by worker threads",
        )
        .expect("valid counter definition");

        let causality_adjustments = Counter::new(
            "tidvakt_causality_adjustments_total",
            "Inter-host events delayed to the round barrier",
        )
        .expect("valid counter definition");

        let round_duration = Histogram::with_opts(
            HistogramOpts::new(
                "tidvakt_round_duration_seconds",
                "Wall-clock time spent per scheduling round",
            )
            .buckets(vec![0.000_01, 0.000_1, 0.001, 0.01, 0.1]),
        )
        .expect("valid histogram definition");

        registry
            .register(Box::new(dispatched_events.clone()))
            .expect("unique metric name");
        registry
            .register(Box::new(causality_adjustments.clone()))
            .expect("unique metric name");
        registry
            .register(Box::new(round_duration.clone()))
            .expect("unique metric name");

        Self {
            registry,
            dispatched_events,
            causality_adjustments,
            round_duration,
        }
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_exposition() {
        let metrics = MetricsRecorder::new();
        metrics.dispatched_events.inc_by(3.0);
        metrics.causality_adjustments.inc();

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("tidvakt_dispatched_events_total 3"));
        assert!(text.contains("tidvakt_causality_adjustments_total 1"));
    }
}
