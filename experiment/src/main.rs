use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use experiment::{DEFAULT_CONFIG, ExperimentConfig, Overrides, Result, run_fat, run_memory};
use log::{error, info};

#[derive(Parser)]
#[command(about = "Empirical capacity of parameterized quantum circuits")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Estimate the fat-shattering dimension
    Fat(Overrides),
    /// Estimate the memorization capacity
    Memory(Overrides),
}

fn run(cli: Cli) -> Result<PathBuf> {
    let mut config = ExperimentConfig::load(&cli.config)?;

    match cli.command {
        Command::Fat(overrides) => {
            overrides.apply(&mut config);
            run_fat(config)
        }
        Command::Memory(overrides) => {
            overrides.apply(&mut config);
            run_memory(config)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(path) => {
            info!("results saved to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
