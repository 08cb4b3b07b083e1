//! fgadsl-cli: command-line front end for the model compiler
//!
//! Wires [`fgadsl_domain`] to files and stdin, with layered configuration
//! and structured logging.

pub mod commands;
pub mod config;
pub mod observability;

pub use commands::{execute, read_input, Command};
pub use config::{CliConfig, ConfigLoadError, LoggingSettings};
