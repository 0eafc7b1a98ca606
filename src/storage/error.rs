use thiserror::Error;

use super::backend::BackendError;
use super::codec::CodecError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: CodecError,
    },

    #[error("Entry '{key}' is corrupt: {source}")]
    Corruption {
        key: String,
        #[source]
        source: CodecError,
    },

    #[error("Not enough space for '{key}': needs {required} bytes, {available} available")]
    Capacity {
        key: String,
        required: u64,
        available: u64,
    },

    #[error("Entry '{key}' is {size} bytes, over the per-entry ceiling of {ceiling}")]
    Oversized { key: String, size: u64, ceiling: u64 },

    #[error("Storage is full: '{key}' ({required} bytes) rejected after emergency cleanup")]
    FatalCapacity { key: String, required: u64 },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Whether recovering requires an explicit full clear by the user
    pub fn requires_manual_clear(&self) -> bool {
        matches!(self, StorageError::FatalCapacity { .. })
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
