//! Structured logging with tracing.
//!
//! Worker threads are named at spawn, so enabling thread names here makes
//! every scheduler log line attributable to its worker without extra
//! fields.

use tracing_subscriber::EnvFilter;

pub struct EventLogger;

impl EventLogger {
    /// Install the global subscriber at the given verbosity.
    ///
    /// `RUST_LOG` still takes precedence over `level`, so a deployed
    /// simulation can be re-leveled without a config change. Idempotent:
    /// if a subscriber is already installed (an embedding application, a
    /// second engine, a test harness), that one stays in place.
    pub fn init(level: &str) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(level.to_string())),
            )
            .with_thread_names(true)
            .try_init();
    }
}
