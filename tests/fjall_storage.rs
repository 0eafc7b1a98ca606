use serde_json::{Value, json};
use tempfile::TempDir;

use planstore::config::Config;
use planstore::storage::{
    FjallBackend, HealthStatus, StorageAccessor, StorageBackend, StorageSettings,
};

/// Wizard config as it would appear in config/planstore.toml
fn create_test_config(data_path: &std::path::Path) -> Config {
    let config_toml = format!(
        r#"
[storage]
data_path = "{}"
max_storage_size = 4096
per_entry_ceiling = 2048
essential_keys = ["step1_data", "current_step"]
        "#,
        data_path.display()
    );

    toml::from_str(&config_toml).expect("Failed to parse test config")
}

fn contains(storage: &StorageAccessor<FjallBackend>, key: &str) -> bool {
    storage.backend().get(key).unwrap().is_some()
}

fn open_accessor(config: &Config) -> StorageAccessor<FjallBackend> {
    let backend = FjallBackend::open(&config.storage.data_path)
        .expect("Failed to open test store")
        .with_quota(config.storage.backend_quota.map(|quota| quota.as_u64()));
    StorageAccessor::new(backend, config.storage.settings())
}

#[test]
fn test_values_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir.path().join("wizard"));

    {
        let mut storage = open_accessor(&config);
        assert!(storage.set("step1_data", &json!({"business_name": "Acme", "stage": "idea"})));
        assert!(storage.set("current_step", &2));
    }

    let mut storage = open_accessor(&config);
    assert_eq!(
        storage.get("step1_data", Value::Null),
        json!({"business_name": "Acme", "stage": "idea"})
    );
    assert_eq!(storage.get("current_step", 1), 2);
}

#[test]
fn test_capacity_enforced_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir.path().join("wizard"));
    let mut storage = open_accessor(&config);

    assert!(storage.set("step1_data", &"a".repeat(1500)));
    assert!(storage.set("cache_suggestions", &"b".repeat(1500)));

    // Room only after the cache entry is swept
    assert!(storage.set("step2_data", &"c".repeat(1500)));
    assert!(contains(&storage, "step2_data"));
    assert!(!contains(&storage, "cache_suggestions"));

    assert!(!storage.set("step3_data", &"d".repeat(1500)));
    assert!(storage.usage().unwrap().used <= 4096);
}

#[test]
fn test_backend_quota_triggers_emergency_cleanup() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wizard");
    let mut storage = StorageAccessor::new(
        FjallBackend::open(&path).unwrap().with_quota(Some(600)),
        StorageSettings::with_capacity(4096).essential(["step1_data"]),
    );

    assert!(storage.set("step1_data", &"a".repeat(200)));
    assert!(storage.set("notes", &"b".repeat(300)));
    assert!(storage.set("step2_data", &"c".repeat(200)));

    let keys = storage.keys().unwrap();
    assert_eq!(keys, vec!["step1_data".to_string(), "step2_data".to_string()]);
    assert_eq!(storage.metrics().emergency_cleanups, 1);
}

#[test]
fn test_maintain_on_startup() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir.path().join("wizard"));

    {
        let mut storage = open_accessor(&config);
        assert!(storage.set("step1_data", &"a".repeat(500)));
        assert!(storage.set("temp_import", &"b".repeat(1900)));
        assert!(storage.set("plan_old", &"c".repeat(1000)));
    }

    let mut storage = open_accessor(&config);
    let report = storage.maintain().unwrap();

    assert_eq!(report.before.status, HealthStatus::Warning);
    assert_eq!(report.cleanup.unwrap().removed_count(), 2);
    assert_eq!(report.after.status, HealthStatus::Ok);
    assert_eq!(storage.keys().unwrap(), vec!["step1_data".to_string()]);
}
