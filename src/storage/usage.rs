/// Usage accounting and health classification
use serde::Serialize;
use tracing::debug;

use super::backend::{Result, StorageBackend};
use super::settings::StorageSettings;

/// Bytes an entry occupies against capacity
pub fn entry_size(key: &str, payload: &str) -> u64 {
    (key.len() + payload.len()) as u64
}

/// Snapshot of occupied space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Usage {
    pub used: u64,
    pub capacity: u64,
    pub remaining: u64,
    pub percentage: f64,
    pub entries: usize,
}

impl Usage {
    fn new(used: u64, capacity: u64, entries: usize) -> Self {
        let percentage = if capacity == 0 {
            100.0
        } else {
            used as f64 * 100.0 / capacity as f64
        };

        Self {
            used,
            capacity,
            remaining: capacity.saturating_sub(used),
            percentage,
            entries,
        }
    }
}

/// Sum `len(key) + len(payload)` over every entry
///
/// Entries whose payload cannot be read count their key only; regular cleanup
/// removes them.
pub fn measure<B: StorageBackend + ?Sized>(backend: &B, capacity: u64) -> Result<Usage> {
    let keys = backend.keys()?;
    let mut used = 0u64;

    for key in &keys {
        match backend.get(key) {
            Ok(Some(payload)) => used += entry_size(key, &payload),
            Ok(None) => {}
            Err(e) => {
                debug!(key = %key, error = %e, "Entry unreadable while measuring usage");
                used += key.len() as u64;
            }
        }
    }

    Ok(Usage::new(used, capacity, keys.len()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn classify(usage: &Usage, settings: &StorageSettings) -> Self {
        if usage.percentage >= settings.critical_percentage() {
            HealthStatus::Critical
        } else if usage.percentage >= settings.cleanup_percentage() {
            HealthStatus::Warning
        } else {
            HealthStatus::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Ok => "ok",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        }
    }
}

/// Result of [`super::StorageAccessor::monitor`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub stats: Usage,
}
