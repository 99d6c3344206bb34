//! Custom validation functions for configuration.
//!
//! Provides shared validation logic used across multiple configuration
//! modules.

use validator::ValidationError;

use crate::scheduler::RoundConfig;

/// Validate that a simulation can fit at least one round.
pub fn validate_round_bounds(round: &RoundConfig) -> Result<(), ValidationError> {
    if round.stop_time_ns < round.window_ns {
        return Err(ValidationError::new("stop_time_shorter_than_window"));
    }
    Ok(())
}

/// Validate a log verbosity level.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}
