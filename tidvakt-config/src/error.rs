//! Failure modes of configuration loading.
//!
//! Validation failures are reported with their full dotted path
//! (`scheduler.workers`, `scheduler.round.window_ns`,
//! `telemetry.log_level`) so an operator can go straight from the message
//! to the offending YAML key or `TIDVAKT_*` variable.

use std::path::PathBuf;

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Errors surfaced while assembling a [`TidvaktConfig`](crate::TidvaktConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The merged configuration violates a scheduler or telemetry
    /// constraint (worker count out of range, stop time shorter than the
    /// round window, unknown log level, ...).
    #[error("invalid configuration: {}", describe_failures(.0))]
    Invalid(#[source] ValidationErrors),

    /// The YAML or environment layers could not be parsed into the
    /// configuration shape.
    #[error("could not parse configuration: {0}")]
    Parse(#[from] figment::Error),
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Invalid(errors)
    }
}

/// Flatten nested validation errors into `path: reason` pairs. The config
/// is a tree of `#[validate(nested)]` sections, so failures arrive nested
/// one level per section and need the full path to be actionable.
fn describe_failures(errors: &ValidationErrors) -> String {
    let mut failures = Vec::new();
    collect_failures("", errors, &mut failures);
    failures.sort();
    failures.join("; ")
}

fn collect_failures(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let reason = match &error.message {
                        Some(message) => message.to_string(),
                        None => error.code.to_string(),
                    };
                    out.push(format!("{path}: {reason}"));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_failures(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_failures(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}
