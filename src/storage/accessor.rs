use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::observability::{Metrics, MetricsSnapshot};

use super::backend::StorageBackend;
use super::category::{Classifier, EntryCategory};
use super::cleanup::{self, CleanupReport, EmergencyCleanup, RegularCleanup};
use super::codec;
use super::error::{Result, StorageError};
use super::settings::StorageSettings;
use super::usage::{self, HealthReport, HealthStatus, Usage, entry_size};

/// Outcome of [`StorageAccessor::maintain`]
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceReport {
    pub before: HealthReport,
    /// `None` when usage was below the cleanup threshold
    pub cleanup: Option<CleanupReport>,
    pub after: HealthReport,
}

/// Capacity-bounded façade over a [`StorageBackend`]
///
/// The accessor is the only writer of its backend. Reads degrade to a caller
/// default and writes report success as a `bool`, so nothing a backend does can
/// surface as a panic or error in form code. The `try_*` variants expose the
/// underlying [`StorageError`] for callers that want it.
///
/// ## Write path
///
/// 1. Encode and frame the value, compute `len(key) + len(payload)`. A payload
///    over the per-entry ceiling is rejected outright.
/// 2. If usage is at the cleanup threshold or the entry would not fit, run
///    regular cleanup and measure again. Still no room: fail without touching
///    the backend.
/// 3. Write. If the backend itself reports its quota exceeded, run emergency
///    cleanup and retry exactly once.
/// 4. A second rejection is fatal and raises the manual-clear notice.
pub struct StorageAccessor<B> {
    backend: B,
    settings: StorageSettings,
    classifier: Classifier,
    metrics: Metrics,
    needs_manual_clear: bool,
}

impl<B: StorageBackend> StorageAccessor<B> {
    pub fn new(backend: B, settings: StorageSettings) -> Self {
        let classifier = Classifier::new(&settings);
        Self {
            backend,
            settings,
            classifier,
            metrics: Metrics::new(),
            needs_manual_clear: false,
        }
    }

    pub fn settings(&self) -> &StorageSettings {
        &self.settings
    }

    /// Read-only view of the backend (inspection and tests)
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Category a write to `key` would be tagged with
    pub fn classify(&self, key: &str) -> EntryCategory {
        self.classifier.classify(key)
    }

    /// True after a write failed even with emergency cleanup, until [`Self::clear_all`]
    pub fn requires_manual_clear(&self) -> bool {
        self.needs_manual_clear
    }

    pub fn usage(&self) -> Result<Usage> {
        Ok(usage::measure(&self.backend, self.settings.max_storage_size)?)
    }

    /// Classify current usage against the thresholds. Never mutates storage.
    pub fn monitor(&self) -> Result<HealthReport> {
        let stats = self.usage()?;
        let status = HealthStatus::classify(&stats, &self.settings);
        Ok(HealthReport { status, stats })
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.backend.keys()?)
    }

    /// Read a value, falling back to `default` on absence or any failure
    pub fn get<T: DeserializeOwned>(&mut self, key: &str, default: T) -> T {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e @ StorageError::Corruption { .. }) => {
                warn!(key, error = %e, "Corrupt entry, returning default");
                default
            }
            Err(e) => {
                warn!(key, error = %e, "Read failed, returning default");
                default
            }
        }
    }

    /// Read a value; `Ok(None)` when absent
    pub fn try_get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        self.cleanup_if_near_capacity()?;

        let Some(payload) = self.backend.get(key)? else {
            return Ok(None);
        };

        match codec::decode_payload::<T>(&payload) {
            Ok((_, value)) => Ok(Some(value)),
            Err(source) => {
                self.metrics.corrupt_read();
                Err(StorageError::Corruption {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Write a value; `false` means the user should be told storage failed
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        match self.try_set(key, value) {
            Ok(()) => true,
            Err(e @ StorageError::FatalCapacity { .. }) => {
                error!(key, error = %e, "Storage is full, clear data to continue");
                false
            }
            Err(e) => {
                warn!(key, error = %e, "Write failed");
                false
            }
        }
    }

    /// Write a value tagged by the configured classification rules
    pub fn try_set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let category = self.classifier.classify(key);
        self.try_set_as(key, value, category)
    }

    /// Write a value with an explicit category
    ///
    /// Emergency cleanup consults the essential key set, not the tag, so tagging
    /// a key essential here only protects it from regular cleanup.
    pub fn try_set_as<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        category: EntryCategory,
    ) -> Result<()> {
        let result = self.write(key, value, category);
        match result {
            Ok(()) => self.metrics.write_stored(),
            Err(_) => self.metrics.write_failed(),
        }
        result
    }

    /// Remove one entry; returns whether it existed
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let existed = self.backend.get(key)?.is_some();
        self.backend.remove(key)?;
        debug!(key, existed, "Removed entry");
        Ok(existed)
    }

    pub fn run_regular_cleanup(&mut self) -> Result<CleanupReport> {
        let policy = RegularCleanup::new(self.settings.per_entry_ceiling);
        let report = cleanup::sweep(&mut self.backend, &policy)?;
        self.metrics.regular_cleanup(report.removed_count());
        Ok(report)
    }

    pub fn run_emergency_cleanup(&mut self) -> Result<CleanupReport> {
        let policy = EmergencyCleanup::new(&self.settings.essential_keys);
        let report = cleanup::sweep(&mut self.backend, &policy)?;
        self.metrics.emergency_cleanup(report.removed_count());
        Ok(report)
    }

    /// Start-up routine: clean proactively when the monitor reports pressure
    pub fn maintain(&mut self) -> Result<MaintenanceReport> {
        let before = self.monitor()?;

        let (cleanup, after) = if before.status == HealthStatus::Ok {
            (None, before)
        } else {
            let report = self.run_regular_cleanup()?;
            (Some(report), self.monitor()?)
        };

        info!(
            before = before.status.as_str(),
            after = after.status.as_str(),
            used = after.stats.used,
            "Storage maintenance finished"
        );

        Ok(MaintenanceReport {
            before,
            cleanup,
            after,
        })
    }

    /// Remove every entry, essential ones included
    ///
    /// This is the user-invoked escape hatch after a fatal capacity failure.
    pub fn clear_all(&mut self) -> Result<usize> {
        let keys = self.backend.keys()?;
        for key in &keys {
            self.backend.remove(key)?;
        }

        self.needs_manual_clear = false;
        warn!(removed = keys.len(), "Cleared all stored entries");
        Ok(keys.len())
    }

    fn cleanup_if_near_capacity(&mut self) -> Result<Option<CleanupReport>> {
        let usage = self.usage()?;
        if usage.percentage < self.settings.cleanup_percentage() {
            return Ok(None);
        }

        info!(
            percentage = usage.percentage,
            used = usage.used,
            "Usage at cleanup threshold, running regular cleanup"
        );
        self.run_regular_cleanup().map(Some)
    }

    fn write<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        category: EntryCategory,
    ) -> Result<()> {
        let json = codec::encode(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        let payload = codec::frame(category, &json);
        let size = entry_size(key, &payload);

        // Regular cleanup sweeps anything over the ceiling, so never store it
        let ceiling = self.settings.per_entry_ceiling;
        if payload.len() as u64 > ceiling {
            warn!(key, size, ceiling, "Entry exceeds the per-entry ceiling, write rejected");
            return Err(StorageError::Oversized {
                key: key.to_string(),
                size: payload.len() as u64,
                ceiling,
            });
        }

        self.ensure_room(key, size)?;

        match self.backend.set(key, &payload) {
            Ok(()) => {}
            Err(e) if e.is_quota_exceeded() => {
                warn!(key, size, error = %e, "Backend rejected write, running emergency cleanup");
                self.run_emergency_cleanup()?;

                if let Err(e) = self.backend.set(key, &payload) {
                    if !e.is_quota_exceeded() {
                        return Err(e.into());
                    }
                    self.needs_manual_clear = true;
                    return Err(StorageError::FatalCapacity {
                        key: key.to_string(),
                        required: size,
                    });
                }
            }
            Err(e) => return Err(e.into()),
        }

        debug!(key, size, %category, "Stored entry");
        Ok(())
    }

    /// Make sure `size` more bytes fit, replacing whatever `key` holds now
    fn ensure_room(&mut self, key: &str, size: u64) -> Result<()> {
        let capacity = self.settings.max_storage_size;
        let fits = |used: u64, replaced: u64| used.saturating_sub(replaced) + size <= capacity;

        let mut usage = self.usage()?;
        let mut replaced = self.stored_size(key);

        if usage.percentage >= self.settings.cleanup_percentage() || !fits(usage.used, replaced) {
            self.run_regular_cleanup()?;
            usage = self.usage()?;
            replaced = self.stored_size(key);
        }

        if fits(usage.used, replaced) {
            return Ok(());
        }

        let available = capacity.saturating_sub(usage.used.saturating_sub(replaced));
        warn!(key, required = size, available, "Not enough space after cleanup, write aborted");
        Err(StorageError::Capacity {
            key: key.to_string(),
            required: size,
            available,
        })
    }

    fn stored_size(&self, key: &str) -> u64 {
        match self.backend.get(key) {
            Ok(Some(payload)) => entry_size(key, &payload),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::MemoryBackend;
    use serde::Deserialize;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct BusinessProfile {
        name: String,
        industry: String,
        employees: u32,
    }

    fn create_test_accessor(capacity: u64) -> StorageAccessor<MemoryBackend> {
        let settings = StorageSettings::with_capacity(capacity).essential(["step1_data"]);
        StorageAccessor::new(MemoryBackend::new(), settings)
    }

    #[test]
    fn test_set_and_get_struct() {
        let mut storage = create_test_accessor(10_000);
        let profile = BusinessProfile {
            name: "Acme Bakery".to_string(),
            industry: "food".to_string(),
            employees: 12,
        };

        assert!(storage.set("step1_data", &profile));

        let loaded: BusinessProfile = storage.get(
            "step1_data",
            BusinessProfile {
                name: String::new(),
                industry: String::new(),
                employees: 0,
            },
        );
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_get_missing_returns_default() {
        let mut storage = create_test_accessor(1000);
        let value = storage.get("step2_data", json!({"empty": true}));
        assert_eq!(value, json!({"empty": true}));
    }

    #[test]
    fn test_writes_are_tagged_by_category() {
        let mut storage = create_test_accessor(10_000);
        assert!(storage.set("step1_data", &json!(1)));
        assert!(storage.set("cache_suggestions", &json!(["a"])));
        assert!(storage.set("plan_backup", &json!(2)));
        assert!(storage.set("step2_data", &json!(3)));

        let backend = storage.backend();
        assert_eq!(backend.get("step1_data").unwrap().as_deref(), Some("e:1"));
        assert_eq!(backend.get("cache_suggestions").unwrap().as_deref(), Some("t:[\"a\"]"));
        assert_eq!(backend.get("plan_backup").unwrap().as_deref(), Some("d:2"));
        assert_eq!(backend.get("step2_data").unwrap().as_deref(), Some("n:3"));
    }

    #[test]
    fn test_explicit_category() {
        let mut storage = create_test_accessor(10_000);
        storage
            .try_set_as("ai_draft", &json!("text"), EntryCategory::Ephemeral)
            .unwrap();

        assert_eq!(
            storage.backend().get("ai_draft").unwrap().as_deref(),
            Some("t:\"text\"")
        );

        let report = storage.run_regular_cleanup().unwrap();
        assert_eq!(report.removed_keys().collect::<Vec<_>>(), vec!["ai_draft"]);
    }

    #[test]
    fn test_overwrite_reuses_space() {
        let mut storage = create_test_accessor(100);
        let value = "x".repeat(60);

        assert!(storage.set("notes", &value));
        // A second copy would not fit next to the first, but it replaces it
        assert!(storage.set("notes", &value));
        assert_eq!(storage.usage().unwrap().used, ("notes".len() + 2 + 62) as u64);
    }

    #[test]
    fn test_corrupt_entry_returns_default() {
        let mut backend = MemoryBackend::new();
        backend.set("step3_data", "n:{broken").unwrap();
        let mut storage = StorageAccessor::new(backend, StorageSettings::with_capacity(1000));

        let value = storage.get("step3_data", json!("fallback"));
        assert_eq!(value, json!("fallback"));

        // Decode failure alone does not delete the entry
        assert!(storage.backend().contains("step3_data"));
        assert_eq!(storage.metrics().corrupt_reads, 1);
    }

    #[test]
    fn test_try_get_reports_corruption() {
        let mut backend = MemoryBackend::new();
        backend.set("step3_data", "not framed").unwrap();
        let mut storage = StorageAccessor::new(backend, StorageSettings::with_capacity(1000));

        let result = storage.try_get::<Value>("step3_data");
        assert!(matches!(result, Err(StorageError::Corruption { .. })));
    }

    #[test]
    fn test_type_mismatch_is_corruption() {
        let mut storage = create_test_accessor(1000);
        assert!(storage.set("step2_data", &json!({"revenue": "lots"})));

        let value: u32 = storage.get("step2_data", 7);
        assert_eq!(value, 7);
    }

    #[test]
    fn test_unserializable_value_fails() {
        let mut storage = create_test_accessor(1000);
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 1u8);

        let result = storage.try_set("step2_data", &bad);
        assert!(matches!(result, Err(StorageError::Encode { .. })));
        assert!(!storage.set("step2_data", &bad));
        assert_eq!(storage.metrics().writes_failed, 2);
    }

    #[test]
    fn test_entry_over_ceiling_is_rejected() {
        let mut settings = StorageSettings::with_capacity(1000).essential(["step1_data"]);
        settings.per_entry_ceiling = 500;
        let mut storage = StorageAccessor::new(MemoryBackend::new(), settings);
        assert!(storage.set("step2_data", &json!("keep")));

        let result = storage.try_set("step1_data", &"x".repeat(840));
        assert!(matches!(
            result,
            Err(StorageError::Oversized { size: 844, ceiling: 500, .. })
        ));
        assert!(!storage.set("step1_data", &"x".repeat(840)));
        assert!(!storage.backend().contains("step1_data"));
        assert_eq!(storage.get("step2_data", json!(null)), json!("keep"));
    }

    #[test]
    fn test_entry_at_ceiling_is_readable() {
        let mut settings = StorageSettings::with_capacity(1000).essential(["step1_data"]);
        settings.per_entry_ceiling = 500;
        let mut storage = StorageAccessor::new(MemoryBackend::new(), settings);

        // "e:" + quotes + 496 chars = 500 bytes
        let value = json!("x".repeat(496));
        assert!(storage.set("step1_data", &value));
        assert_eq!(storage.get("step1_data", json!("default")), value);
    }

    #[test]
    fn test_entry_larger_than_capacity() {
        let mut storage = create_test_accessor(50);
        let result = storage.try_set("notes", &"x".repeat(100));

        assert!(matches!(result, Err(StorageError::Capacity { .. })));
        assert!(storage.backend().is_empty());
    }

    #[test]
    fn test_monitor_does_not_mutate() {
        let mut storage = create_test_accessor(100);
        assert!(storage.set("cache_x", &"x".repeat(80)));

        let report = storage.monitor().unwrap();
        assert_eq!(report.status, HealthStatus::Critical);
        assert!(storage.backend().contains("cache_x"));
    }

    #[test]
    fn test_maintain_cleans_under_pressure() {
        let mut storage = create_test_accessor(100);
        assert!(storage.set("cache_x", &"x".repeat(75)));

        let report = storage.maintain().unwrap();
        assert_eq!(report.before.status, HealthStatus::Warning);
        assert_eq!(report.cleanup.as_ref().unwrap().removed_count(), 1);
        assert_eq!(report.after.status, HealthStatus::Ok);
        assert!(storage.backend().is_empty());
    }

    #[test]
    fn test_maintain_skips_when_healthy() {
        let mut storage = create_test_accessor(1000);
        assert!(storage.set("cache_x", &"x"));

        let report = storage.maintain().unwrap();
        assert!(report.cleanup.is_none());
        assert!(storage.backend().contains("cache_x"));
    }

    #[test]
    fn test_remove_and_clear_all() {
        let mut storage = create_test_accessor(1000);
        assert!(storage.set("step1_data", &1));
        assert!(storage.set("step2_data", &2));

        assert!(storage.remove("step2_data").unwrap());
        assert!(!storage.remove("step2_data").unwrap());

        assert_eq!(storage.clear_all().unwrap(), 1);
        assert!(storage.backend().is_empty());
        assert!(!storage.requires_manual_clear());
    }
}
