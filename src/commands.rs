use planstore::config::{ByteSize, Config};
use planstore::storage::{
    CleanupReport, FjallBackend, HealthReport, StorageAccessor, StorageBackend, codec,
};
use serde_json::Value;
use tracing::info;

use crate::cli::Commands;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn open_storage(config: &Config) -> Result<StorageAccessor<FjallBackend>, AnyError> {
    let backend = FjallBackend::open(&config.storage.data_path)?
        .with_quota(config.storage.backend_quota.map(|quota| quota.as_u64()));
    info!(path = %config.storage.data_path.display(), "Storage opened");
    Ok(StorageAccessor::new(backend, config.storage.settings()))
}

pub fn run(command: Commands, config: Config) -> Result<(), AnyError> {
    match command {
        Commands::Config => print!("{}", toml::to_string_pretty(&config)?),
        Commands::Status => print_health(&open_storage(&config)?.monitor()?),
        Commands::Keys => print_keys(open_storage(&config)?.backend())?,
        Commands::Get(args) => {
            let default: Value = serde_json::from_str(&args.default)?;
            let value = open_storage(&config)?.get(&args.key, default);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Set(args) => {
            let value: Value = serde_json::from_str(&args.value)?;
            let mut storage = open_storage(&config)?;
            let category = storage.classify(&args.key);
            storage.try_set(&args.key, &value)?;
            println!("stored {} ({category})", args.key);
        }
        Commands::Remove(args) => {
            if open_storage(&config)?.remove(&args.key)? {
                println!("removed {}", args.key);
            } else {
                println!("{} not found", args.key);
            }
        }
        Commands::Cleanup(args) => {
            let mut storage = open_storage(&config)?;
            let report = if args.emergency {
                storage.run_emergency_cleanup()?
            } else {
                storage.run_regular_cleanup()?
            };
            print_cleanup(&report);
        }
        Commands::Maintain => {
            let report = open_storage(&config)?.maintain()?;
            print_health(&report.before);
            match &report.cleanup {
                Some(cleanup) => {
                    print_cleanup(cleanup);
                    print_health(&report.after);
                }
                None => println!("no cleanup needed"),
            }
        }
        Commands::Clear(args) => {
            if !args.yes {
                return Err("refusing to clear all data without --yes".into());
            }
            let removed = open_storage(&config)?.clear_all()?;
            println!("cleared {removed} entries");
        }
    }

    Ok(())
}

fn print_health(report: &HealthReport) {
    let stats = &report.stats;
    println!("status:    {}", report.status.as_str());
    println!(
        "used:      {} / {} ({:.1}%)",
        ByteSize(stats.used),
        ByteSize(stats.capacity),
        stats.percentage
    );
    println!("remaining: {}", ByteSize(stats.remaining));
    println!("entries:   {}", stats.entries);
}

fn print_keys<B: StorageBackend>(backend: &B) -> Result<(), AnyError> {
    for key in backend.keys()? {
        match backend.get(&key)? {
            Some(payload) => {
                let category = codec::unframe(&payload)
                    .map(|(category, _)| category.to_string())
                    .unwrap_or_else(|_| "corrupt".to_string());
                let size = ByteSize((key.len() + payload.len()) as u64);
                println!("{key}\t{category}\t{size}");
            }
            None => println!("{key}\tmissing\t-"),
        }
    }
    Ok(())
}

fn print_cleanup(report: &CleanupReport) {
    println!(
        "{} cleanup: scanned {}, removed {}, freed {}",
        report.policy,
        report.scanned,
        report.removed_count(),
        ByteSize(report.freed_bytes)
    );
    for entry in &report.removed {
        println!("  {}\t{}", entry.key, entry.reason);
    }
}
