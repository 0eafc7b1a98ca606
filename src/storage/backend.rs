//! Persistence primitive consumed by the accessor
//!
//! A backend is a plain key → string map. It knows nothing about categories,
//! thresholds, or cleanup; it only reports when it refuses a write because it
//! has no room left.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Quota exceeded writing '{key}': {required} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        required: u64,
        quota: u64,
    },

    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored payload for '{key}' is not valid UTF-8")]
    InvalidUtf8 { key: String },
}

impl BackendError {
    /// Capacity rejection signalled by the backend itself
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, BackendError::QuotaExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Durable key → string map
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `payload` under `key`, replacing any previous payload.
    ///
    /// Returns [`BackendError::QuotaExceeded`] when the backend has no room.
    fn set(&mut self, key: &str, payload: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory backend for tests and development
///
/// An optional quota makes it behave like a browser store with a stricter
/// limit than the accessor's own accounting.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
    quota: Option<u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push the total past `quota` bytes
    pub fn with_quota(quota: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn total_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, payload: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            let replaced = self
                .entries
                .get(key)
                .map(|v| (key.len() + v.len()) as u64)
                .unwrap_or(0);
            let required = (key.len() + payload.len()) as u64;
            if self.total_bytes() - replaced + required > quota {
                return Err(BackendError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }

        self.entries.insert(key.to_string(), payload.to_string());
        debug!(key, size = payload.len(), "Stored entry in memory");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}
