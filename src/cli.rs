use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "planstore")]
#[command(about = "Inspect and maintain the planning wizard's local storage", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $PLANSTORE_CONFIG or config/planstore.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show usage and health status
    Status,
    /// List stored keys with their category and size
    Keys,
    /// Print the value stored under a key
    Get(GetArgs),
    /// Store a JSON value under a key
    Set(SetArgs),
    /// Delete one key
    Remove(KeyArgs),
    /// Run a cleanup sweep now
    Cleanup(CleanupArgs),
    /// Clean up if usage is above the cleanup threshold
    Maintain,
    /// Delete every entry, essential ones included
    Clear(ClearArgs),
    /// Print the resolved configuration as TOML
    Config,
}

#[derive(clap::Args, Debug)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    pub key: String,
    /// JSON printed when the key is absent or corrupt
    #[arg(long, default_value = "null")]
    pub default: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    pub key: String,
    /// Value as JSON text, e.g. '{"business_name":"Acme"}'
    pub value: String,
}

#[derive(clap::Args, Debug)]
pub struct CleanupArgs {
    /// Keep only essential keys instead of the regular sweep
    #[arg(long)]
    pub emergency: bool,
}

#[derive(clap::Args, Debug)]
pub struct ClearArgs {
    /// Required to confirm the full clear
    #[arg(long)]
    pub yes: bool,
}
