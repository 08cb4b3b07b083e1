//! Subcommands of the `fgadsl` binary.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use fgadsl_domain::compiler::{compile_with, dsl_to_json, json_to_dsl, metadata_from_source};
use fgadsl_domain::CompilerConfig;
use tracing::info;

/// A model conversion or inspection to run.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compile a model (DSL or JSON) to the OpenFGA JSON document
    ToJson {
        /// Model file, or `-` for stdin
        file: PathBuf,
    },
    /// Compile a model (DSL or JSON) to canonical DSL
    ToDsl {
        /// Model file, or `-` for stdin
        file: PathBuf,
    },
    /// Print relationship metadata as JSON
    Metadata {
        /// Model file, or `-` for stdin
        file: PathBuf,
    },
    /// Check that a model parses and validates
    Validate {
        /// Model file, or `-` for stdin
        file: PathBuf,
    },
}

impl Command {
    /// The input path this command reads.
    pub fn file(&self) -> &Path {
        match self {
            Command::ToJson { file }
            | Command::ToDsl { file }
            | Command::Metadata { file }
            | Command::Validate { file } => file,
        }
    }
}

/// Reads the model text from `path`, or from stdin when the path is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read model from stdin")?;
        return Ok(input);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read model from {}", path.display()))
}

/// Runs `command` against already loaded model text, returning what to print.
pub fn execute(command: &Command, input: &str, config: &CompilerConfig) -> anyhow::Result<String> {
    match command {
        Command::ToJson { .. } => {
            let json = dsl_to_json(input, config)?;
            Ok(serde_json::to_string_pretty(&json)?)
        }
        Command::ToDsl { .. } => Ok(json_to_dsl(input, config)?),
        Command::Metadata { .. } => {
            let metadata = metadata_from_source(input, config)?;
            Ok(serde_json::to_string_pretty(&metadata)?)
        }
        Command::Validate { .. } => {
            let (model, format) = compile_with(input, config)?;
            info!(?format, "model is valid");
            Ok(format!(
                "valid ({format}): {} types, {} conditions",
                model.type_definitions.len(),
                model.conditions.len()
            ))
        }
    }
}
