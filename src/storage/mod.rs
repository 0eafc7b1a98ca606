//! Capacity-bounded key-value storage for wizard form state
//!
//! Every wizard step saves and reloads its form through a [`StorageAccessor`].
//! The accessor sits on top of any [`StorageBackend`] (an in-memory map for
//! tests, Fjall on disk for the CLI) and enforces a byte budget:
//!
//! - writes are tagged with an [`EntryCategory`] so cleanup knows what is cheap
//!   to lose,
//! - regular cleanup sweeps ephemeral, duplicate, oversized and unreadable
//!   entries once usage crosses the cleanup threshold,
//! - emergency cleanup keeps only the essential key set when the backend itself
//!   refuses a write,
//! - corrupt payloads read back as the caller's default.
//!
//! ## Usage
//!
//! ```rust
//! use planstore::storage::{MemoryBackend, StorageAccessor, StorageSettings};
//! use serde_json::json;
//!
//! let settings = StorageSettings::with_capacity(64 * 1024).essential(["step1_data"]);
//! let mut storage = StorageAccessor::new(MemoryBackend::new(), settings);
//!
//! assert!(storage.set("step1_data", &json!({"business_name": "Acme"})));
//! let form = storage.get("step1_data", json!({}));
//! assert_eq!(form["business_name"], "Acme");
//! ```

pub mod accessor;
pub mod backend;
pub mod category;
pub mod cleanup;
pub mod codec;
pub mod error;
pub mod fjall_backend;
pub mod settings;
pub mod usage;

pub use accessor::{MaintenanceReport, StorageAccessor};
pub use backend::{BackendError, MemoryBackend, StorageBackend};
pub use category::{Classifier, EntryCategory};
pub use cleanup::{CleanupPolicy, CleanupReason, CleanupReport, EmergencyCleanup, RegularCleanup};
pub use codec::CodecError;
pub use error::{Result, StorageError};
pub use fjall_backend::FjallBackend;
pub use settings::StorageSettings;
pub use usage::{HealthReport, HealthStatus, Usage};
