//! # Tidvakt Configuration System
//!
//! Hierarchical configuration management for the tidvakt simulator.
//!
//! ## Features
//! - **Unified Configuration**: Single source of truth across all components
//! - **Validation**: Runtime validation of critical parameters
//! - **Environment Awareness**: Environment-specific override files
//! - **Deterministic Defaults**: A default config always validates and runs

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod scheduler;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use scheduler::RoundConfig;
pub use scheduler::SchedulerConfig;
pub use telemetry::TelemetryConfig;

/// Top-level configuration container for all tidvakt components.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct TidvaktConfig {
    /// Worker pool and round-window parameters.
    #[validate(nested)]
    pub scheduler: SchedulerConfig,

    /// Telemetry and observability configuration.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl TidvaktConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/tidvakt.yaml` - base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - environment-specific overrides.
    /// 4. `TIDVAKT_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(TidvaktConfig::default()));

        if Path::new("config/tidvakt.yaml").exists() {
            figment = figment.merge(Yaml::file("config/tidvakt.yaml"));
        }

        let env = std::env::var("TIDVAKT_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        figment
            .merge(Env::prefixed("TIDVAKT_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path for testing/validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Figment::from(Serialized::defaults(TidvaktConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("TIDVAKT_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
