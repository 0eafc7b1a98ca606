use std::path::Path;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use tracing::{debug, info, warn};

use super::backend::{BackendError, Result, StorageBackend};

const ENTRIES_PARTITION: &str = "entries";

/// Fjall-backed durable store for wizard entries
///
/// All entries live in a single `entries` partition keyed by the raw entry key.
/// Every mutation is synced before returning so a reported success survives a
/// crash.
#[derive(Clone)]
pub struct FjallBackend {
    keyspace: Keyspace,
    entries: PartitionHandle,
    quota: Option<u64>,
}

impl FjallBackend {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Fjall store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let entries = keyspace.open_partition(ENTRIES_PARTITION, PartitionCreateOptions::default())?;

        let mut backend = Self {
            keyspace,
            entries,
            quota: None,
        };
        backend.purge_invalid_keys()?;
        Ok(backend)
    }

    /// Delete entries whose key is not valid UTF-8
    ///
    /// Such keys cannot be addressed through [`StorageBackend`], so they are
    /// removed by their raw bytes. Returns how many were deleted.
    pub fn purge_invalid_keys(&mut self) -> Result<usize> {
        let mut invalid = Vec::new();
        for item in self.entries.iter() {
            let (key, _) = item?;
            if std::str::from_utf8(&key).is_err() {
                invalid.push(key);
            }
        }

        if invalid.is_empty() {
            return Ok(0);
        }

        let count = invalid.len();
        for key in invalid {
            self.entries.remove(key)?;
        }
        self.persist()?;
        warn!(count, "Purged entries with non UTF-8 keys");
        Ok(count)
    }

    /// Reject writes that would push the stored total past `quota` bytes
    pub fn with_quota(mut self, quota: Option<u64>) -> Self {
        self.quota = quota;
        self
    }

    fn total_bytes(&self) -> Result<u64> {
        let mut total = 0u64;
        for item in self.entries.iter() {
            let (key, value) = item?;
            total += (key.len() + value.len()) as u64;
        }
        Ok(total)
    }

    fn persist(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

impl StorageBackend for FjallBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entries.get(key.as_bytes())? {
            Some(value) => {
                let payload = String::from_utf8(value.to_vec()).map_err(|_| {
                    BackendError::InvalidUtf8 {
                        key: key.to_string(),
                    }
                })?;
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, payload: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            let replaced = self
                .entries
                .get(key.as_bytes())?
                .map(|v| (key.len() + v.len()) as u64)
                .unwrap_or(0);
            let required = (key.len() + payload.len()) as u64;
            if self.total_bytes()? - replaced + required > quota {
                return Err(BackendError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }

        self.entries.insert(key.as_bytes(), payload.as_bytes())?;
        self.persist()?;
        debug!(key, size = payload.len(), "Stored entry");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key.as_bytes())?;
        self.persist()?;
        debug!(key, "Removed entry");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for item in self.entries.iter() {
            let (key, _) = item?;
            match String::from_utf8(key.to_vec()) {
                Ok(key) => keys.push(key),
                Err(_) => warn!(key = ?key, "Skipping entry with non UTF-8 key"),
            }
        }
        Ok(keys)
    }
}
