//! Cleanup policies
//!
//! A sweep walks every key in the backend, asks a [`CleanupPolicy`] whether the
//! entry should go, and removes what it is told to. Sweeps never retry writes;
//! that is the accessor's job.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::backend::{Result, StorageBackend};
use super::category::EntryCategory;
use super::codec;
use super::usage::entry_size;

/// What a sweep could learn about an entry before asking the policy
#[derive(Debug, Clone, Copy)]
pub enum EntryProbe<'a> {
    /// Payload read successfully
    Stored(&'a str),
    /// Read failed or the key vanished between listing and reading
    Unmeasurable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupReason {
    Ephemeral,
    SupersededDuplicate,
    Oversized,
    Corrupt,
    Unmeasurable,
    NotEssential,
}

impl fmt::Display for CleanupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            CleanupReason::Ephemeral => "ephemeral",
            CleanupReason::SupersededDuplicate => "superseded duplicate",
            CleanupReason::Oversized => "oversized",
            CleanupReason::Corrupt => "corrupt",
            CleanupReason::Unmeasurable => "unmeasurable",
            CleanupReason::NotEssential => "not essential",
        };
        f.write_str(reason)
    }
}

/// Decides which entries a sweep removes
pub trait CleanupPolicy {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Return a reason to remove the entry, or `None` to keep it
    fn evaluate(&self, key: &str, probe: EntryProbe<'_>) -> Option<CleanupReason>;
}

/// Sweeps low-value entries when usage crosses the cleanup threshold
#[derive(Debug, Clone)]
pub struct RegularCleanup {
    per_entry_ceiling: u64,
}

impl RegularCleanup {
    pub fn new(per_entry_ceiling: u64) -> Self {
        Self { per_entry_ceiling }
    }
}

impl CleanupPolicy for RegularCleanup {
    fn name(&self) -> &'static str {
        "regular"
    }

    fn evaluate(&self, _key: &str, probe: EntryProbe<'_>) -> Option<CleanupReason> {
        let payload = match probe {
            EntryProbe::Stored(payload) => payload,
            EntryProbe::Unmeasurable => return Some(CleanupReason::Unmeasurable),
        };

        if payload.len() as u64 > self.per_entry_ceiling {
            return Some(CleanupReason::Oversized);
        }

        match codec::unframe(payload) {
            Ok((EntryCategory::Ephemeral, _)) => Some(CleanupReason::Ephemeral),
            Ok((EntryCategory::SupersededDuplicate, _)) => Some(CleanupReason::SupersededDuplicate),
            Ok(_) => None,
            Err(_) => Some(CleanupReason::Corrupt),
        }
    }
}

/// Removes everything outside the essential allowlist
#[derive(Debug, Clone)]
pub struct EmergencyCleanup<'a> {
    essential: &'a BTreeSet<String>,
}

impl<'a> EmergencyCleanup<'a> {
    pub fn new(essential: &'a BTreeSet<String>) -> Self {
        Self { essential }
    }
}

impl CleanupPolicy for EmergencyCleanup<'_> {
    fn name(&self) -> &'static str {
        "emergency"
    }

    fn evaluate(&self, key: &str, _probe: EntryProbe<'_>) -> Option<CleanupReason> {
        if self.essential.contains(key) {
            None
        } else {
            Some(CleanupReason::NotEssential)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedEntry {
    pub key: String,
    pub reason: CleanupReason,
    /// Zero when the entry could not be measured
    pub size: u64,
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub policy: &'static str,
    pub scanned: usize,
    pub removed: Vec<RemovedEntry>,
    pub freed_bytes: u64,
}

impl CleanupReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn removed_keys(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(|entry| entry.key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Walk every entry and remove those the policy rejects
///
/// Failing to list keys aborts the sweep. Failing to remove a single entry is
/// logged and skipped so one bad key cannot block the rest.
pub fn sweep<B, P>(backend: &mut B, policy: &P) -> Result<CleanupReport>
where
    B: StorageBackend + ?Sized,
    P: CleanupPolicy + ?Sized,
{
    let keys = backend.keys()?;
    let mut report = CleanupReport {
        policy: policy.name(),
        scanned: keys.len(),
        ..CleanupReport::default()
    };

    for key in keys {
        let stored = match backend.get(&key) {
            Ok(stored) => stored,
            Err(e) => {
                debug!(key = %key, error = %e, "Entry unreadable during cleanup");
                None
            }
        };

        let probe = match stored.as_deref() {
            Some(payload) => EntryProbe::Stored(payload),
            None => EntryProbe::Unmeasurable,
        };

        let Some(reason) = policy.evaluate(&key, probe) else {
            continue;
        };

        let size = stored
            .as_deref()
            .map(|payload| entry_size(&key, payload))
            .unwrap_or(0);

        if let Err(e) = backend.remove(&key) {
            warn!(key = %key, policy = policy.name(), error = %e, "Failed to remove entry");
            continue;
        }

        debug!(key = %key, %reason, size, "Removed entry");
        report.freed_bytes += size;
        report.removed.push(RemovedEntry { key, reason, size });
    }

    if report.is_empty() {
        info!(policy = report.policy, scanned = report.scanned, "Cleanup found nothing to remove");
    } else {
        warn!(
            policy = report.policy,
            removed = report.removed_count(),
            freed_bytes = report.freed_bytes,
            keys = ?report.removed_keys().collect::<Vec<_>>(),
            "Cleanup removed entries"
        );
    }

    Ok(report)
}
