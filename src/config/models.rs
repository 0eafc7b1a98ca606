use crate::humanize::ByteSize;
use crate::storage::StorageSettings;
use crate::storage::settings::{
    DEFAULT_CLEANUP_THRESHOLD, DEFAULT_CRITICAL_THRESHOLD, DEFAULT_MAX_STORAGE_SIZE,
    DEFAULT_PER_ENTRY_CEILING,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage manager configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory of the Fjall keyspace
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_max_storage_size")]
    pub max_storage_size: ByteSize,
    #[serde(default = "default_cleanup_threshold")]
    pub cleanup_threshold: f64,
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
    #[serde(default = "default_per_entry_ceiling")]
    pub per_entry_ceiling: ByteSize,
    /// Stricter limit enforced by the backend itself (simulates a browser quota)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_quota: Option<ByteSize>,
    /// Keys that survive emergency cleanup
    #[serde(default)]
    pub essential_keys: Vec<String>,
    #[serde(default = "default_ephemeral_prefixes")]
    pub ephemeral_prefixes: Vec<String>,
    #[serde(default = "default_superseded_suffixes")]
    pub superseded_suffixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_survivor: Option<String>,
}

impl StorageConfig {
    /// Runtime settings for the storage accessor
    pub fn settings(&self) -> StorageSettings {
        StorageSettings {
            max_storage_size: self.max_storage_size.as_u64(),
            cleanup_threshold: self.cleanup_threshold,
            critical_threshold: self.critical_threshold,
            per_entry_ceiling: self.per_entry_ceiling.as_u64(),
            essential_keys: self.essential_keys.iter().cloned().collect(),
            ephemeral_prefixes: self.ephemeral_prefixes.clone(),
            superseded_suffixes: self.superseded_suffixes.clone(),
            ephemeral_survivor: self.ephemeral_survivor.clone(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            max_storage_size: default_max_storage_size(),
            cleanup_threshold: default_cleanup_threshold(),
            critical_threshold: default_critical_threshold(),
            per_entry_ceiling: default_per_entry_ceiling(),
            backend_quota: None,
            essential_keys: Vec::new(),
            ephemeral_prefixes: default_ephemeral_prefixes(),
            superseded_suffixes: default_superseded_suffixes(),
            ephemeral_survivor: None,
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/planstore")
}

fn default_max_storage_size() -> ByteSize {
    ByteSize(DEFAULT_MAX_STORAGE_SIZE)
}

fn default_cleanup_threshold() -> f64 {
    DEFAULT_CLEANUP_THRESHOLD
}

fn default_critical_threshold() -> f64 {
    DEFAULT_CRITICAL_THRESHOLD
}

fn default_per_entry_ceiling() -> ByteSize {
    ByteSize(DEFAULT_PER_ENTRY_CEILING)
}

fn default_ephemeral_prefixes() -> Vec<String> {
    StorageSettings::default().ephemeral_prefixes
}

fn default_superseded_suffixes() -> Vec<String> {
    StorageSettings::default().superseded_suffixes
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
