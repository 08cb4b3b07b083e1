//! fgadsl binary
//!
//! Converts OpenFGA authorization models between DSL and JSON.
//!
//! # Usage
//!
//! ```bash
//! # DSL to JSON
//! fgadsl to-json model.fga
//!
//! # JSON from stdin back to DSL, with a config file
//! cat model.json | fgadsl --config fgadsl.yaml to-dsl -
//!
//! # Environment overrides
//! FGADSL_LOGGING__LEVEL=debug fgadsl validate model.fga
//! ```

use clap::Parser;
use tracing::debug;

use fgadsl_cli::observability::{init_logging, LoggingConfig};
use fgadsl_cli::{execute, read_input, CliConfig, Command};

/// fgadsl - OpenFGA authorization model compiler
#[derive(Parser, Debug)]
#[command(name = "fgadsl")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = if let Some(config_path) = args.config {
        CliConfig::load(&config_path)?
    } else {
        CliConfig::from_env()?
    };

    init_logging(LoggingConfig::from_settings(&config.logging));

    let input = read_input(args.command.file())?;
    debug!(bytes = input.len(), "read model input");

    let output = execute(&args.command, &input, &config.compiler)?;
    println!("{}", output.trim_end_matches('\n'));

    Ok(())
}
