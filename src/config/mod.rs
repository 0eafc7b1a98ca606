//! Configuration management for planstore
//!
//! Settings are layered from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use planstore::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Capacity: {}", config.storage.max_storage_size);
//! ```
//!
//! # Environment Variables
//!
//! Scalar settings can be overridden with `PLANSTORE__<section>__<key>`:
//! - `PLANSTORE__STORAGE__MAX_STORAGE_SIZE=2MB`
//! - `PLANSTORE__STORAGE__CLEANUP_THRESHOLD=0.7`
//! - `PLANSTORE__LOGGING__FILTER=planstore=debug`
//!
//! Lists (`essential_keys` and the naming patterns) come from the TOML file.
//!
//! # Configuration File
//!
//! By default the file is `config/planstore.toml`; set `PLANSTORE_CONFIG` to
//! point elsewhere.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, LoggingConfig, StorageConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path plus the environment
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
