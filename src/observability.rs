//! Logging setup and in-process storage counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber
///
/// `RUST_LOG` wins over the configured filter. Calling this twice is harmless.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Counters recorded by the storage accessor
#[derive(Debug, Default)]
pub struct Metrics {
    writes_stored: AtomicU64,
    writes_failed: AtomicU64,
    corrupt_reads: AtomicU64,
    regular_cleanups: AtomicU64,
    emergency_cleanups: AtomicU64,
    entries_evicted: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_stored(&self) {
        self.writes_stored.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "writes_stored", "Metric incremented");
    }

    pub fn write_failed(&self) {
        self.writes_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "writes_failed", "Metric incremented");
    }

    pub fn corrupt_read(&self) {
        self.corrupt_reads.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "corrupt_reads", "Metric incremented");
    }

    pub fn regular_cleanup(&self, evicted: usize) {
        self.regular_cleanups.fetch_add(1, Ordering::Relaxed);
        self.entries_evicted.fetch_add(evicted as u64, Ordering::Relaxed);
        tracing::debug!(counter = "regular_cleanups", evicted, "Metric incremented");
    }

    pub fn emergency_cleanup(&self, evicted: usize) {
        self.emergency_cleanups.fetch_add(1, Ordering::Relaxed);
        self.entries_evicted.fetch_add(evicted as u64, Ordering::Relaxed);
        tracing::debug!(counter = "emergency_cleanups", evicted, "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            writes_stored: self.writes_stored.load(Ordering::Relaxed),
            writes_failed: self.writes_failed.load(Ordering::Relaxed),
            corrupt_reads: self.corrupt_reads.load(Ordering::Relaxed),
            regular_cleanups: self.regular_cleanups.load(Ordering::Relaxed),
            emergency_cleanups: self.emergency_cleanups.load(Ordering::Relaxed),
            entries_evicted: self.entries_evicted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub writes_stored: u64,
    pub writes_failed: u64,
    pub corrupt_reads: u64,
    pub regular_cleanups: u64,
    pub emergency_cleanups: u64,
    pub entries_evicted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = Metrics::new();
        metrics.write_stored();
        metrics.write_stored();
        metrics.write_failed();
        metrics.corrupt_read();
        metrics.regular_cleanup(3);
        metrics.emergency_cleanup(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.writes_stored, 2);
        assert_eq!(snapshot.writes_failed, 1);
        assert_eq!(snapshot.corrupt_reads, 1);
        assert_eq!(snapshot.regular_cleanups, 1);
        assert_eq!(snapshot.emergency_cleanups, 1);
        assert_eq!(snapshot.entries_evicted, 5);
    }
}
