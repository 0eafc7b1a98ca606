mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use planstore::config::Config;
use planstore::observability;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    observability::init_logging(&config.logging.filter);

    commands::run(cli.command, config)
}
