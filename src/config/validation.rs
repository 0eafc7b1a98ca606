use super::models::{Config, StorageConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Threshold must be within (0, 1]: {field} = {value}")]
    InvalidThreshold { field: &'static str, value: f64 },

    #[error("cleanup_threshold ({cleanup}) must not exceed critical_threshold ({critical})")]
    ThresholdOrder { cleanup: f64, critical: f64 },

    #[error("max_storage_size must be positive")]
    ZeroCapacity,

    #[error("per_entry_ceiling ({ceiling}) exceeds max_storage_size ({capacity})")]
    CeilingExceedsCapacity { ceiling: u64, capacity: u64 },

    #[error("backend_quota must be positive when set")]
    ZeroBackendQuota,

    #[error("Empty value in {field}")]
    EmptyPattern { field: &'static str },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_thresholds(&config.storage)?;
    validate_sizes(&config.storage)?;
    validate_patterns(&config.storage)?;
    Ok(())
}

fn validate_thresholds(storage: &StorageConfig) -> Result<(), ValidationError> {
    for (field, value) in [
        ("cleanup_threshold", storage.cleanup_threshold),
        ("critical_threshold", storage.critical_threshold),
    ] {
        // NaN fails both comparisons and is rejected here too
        if !(value > 0.0 && value <= 1.0) {
            return Err(ValidationError::InvalidThreshold { field, value });
        }
    }

    if storage.cleanup_threshold > storage.critical_threshold {
        return Err(ValidationError::ThresholdOrder {
            cleanup: storage.cleanup_threshold,
            critical: storage.critical_threshold,
        });
    }

    Ok(())
}

fn validate_sizes(storage: &StorageConfig) -> Result<(), ValidationError> {
    let capacity = storage.max_storage_size.as_u64();
    if capacity == 0 {
        return Err(ValidationError::ZeroCapacity);
    }

    let ceiling = storage.per_entry_ceiling.as_u64();
    if ceiling > capacity {
        return Err(ValidationError::CeilingExceedsCapacity { ceiling, capacity });
    }

    if storage.backend_quota.is_some_and(|quota| quota.as_u64() == 0) {
        return Err(ValidationError::ZeroBackendQuota);
    }

    Ok(())
}

/// Empty keys or patterns would match everything or nothing silently
fn validate_patterns(storage: &StorageConfig) -> Result<(), ValidationError> {
    let lists: [(&'static str, &[String]); 3] = [
        ("essential_keys", storage.essential_keys.as_slice()),
        ("ephemeral_prefixes", storage.ephemeral_prefixes.as_slice()),
        ("superseded_suffixes", storage.superseded_suffixes.as_slice()),
    ];

    for (field, values) in lists {
        if values.iter().any(|value| value.is_empty()) {
            return Err(ValidationError::EmptyPattern { field });
        }
    }

    if storage.ephemeral_survivor.as_deref() == Some("") {
        return Err(ValidationError::EmptyPattern {
            field: "ephemeral_survivor",
        });
    }

    Ok(())
}
