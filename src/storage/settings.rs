use std::collections::BTreeSet;

/// Default capacity, roughly a browser's per-origin local storage allowance
pub const DEFAULT_MAX_STORAGE_SIZE: u64 = 5 * 1024 * 1024;
pub const DEFAULT_CLEANUP_THRESHOLD: f64 = 0.8;
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.9;
pub const DEFAULT_PER_ENTRY_CEILING: u64 = 500 * 1024;

/// Runtime settings injected into [`super::StorageAccessor`]
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// Byte ceiling across all entries (key + payload)
    pub max_storage_size: u64,
    /// Fraction of capacity at which regular cleanup runs
    pub cleanup_threshold: f64,
    /// Fraction of capacity reported as critical by the monitor
    pub critical_threshold: f64,
    /// Payloads larger than this are swept by regular cleanup
    pub per_entry_ceiling: u64,
    pub essential_keys: BTreeSet<String>,
    pub ephemeral_prefixes: Vec<String>,
    pub superseded_suffixes: Vec<String>,
    /// Ephemeral-looking key that regular cleanup keeps
    pub ephemeral_survivor: Option<String>,
}

impl StorageSettings {
    /// Settings with a given capacity and every other field at its default
    pub fn with_capacity(max_storage_size: u64) -> Self {
        Self {
            max_storage_size,
            ..Self::default()
        }
    }

    pub fn essential<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.essential_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Usage percentage at or above which regular cleanup runs
    pub fn cleanup_percentage(&self) -> f64 {
        self.cleanup_threshold * 100.0
    }

    pub fn critical_percentage(&self) -> f64 {
        self.critical_threshold * 100.0
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            max_storage_size: DEFAULT_MAX_STORAGE_SIZE,
            cleanup_threshold: DEFAULT_CLEANUP_THRESHOLD,
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            per_entry_ceiling: DEFAULT_PER_ENTRY_CEILING,
            essential_keys: BTreeSet::new(),
            ephemeral_prefixes: vec!["cache_".to_string(), "temp_".to_string()],
            superseded_suffixes: vec!["_backup".to_string(), "_old".to_string()],
            ephemeral_survivor: None,
        }
    }
}
