//! Compile entry points accepting either model JSON or DSL text.
//!
//! Compilation runs in two stages:
//!
//! 1. [`parse_source`] tries the JSON reader, then the DSL parser, and
//!    returns the first model that parses. If both fail the DSL error is
//!    reported with the JSON error kept as context.
//! 2. [`compile_with`] validates the parsed model. A model that parses but
//!    fails validation is an error; the other format is not retried.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::CompilerConfig;
use crate::error::{DomainError, DomainResult};
use crate::metadata::{extract_metadata_with, RelationshipMetadata};
use crate::model::{parse_with_config, to_dsl, AuthorizationModel, ParserResult};
use crate::validation::validate;
use crate::wire::{model_from_json, model_to_json, WireResult};

/// Source format a model was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Dsl,
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelFormat::Json => write!(f, "json"),
            ModelFormat::Dsl => write!(f, "dsl"),
        }
    }
}

fn try_json(input: &str) -> WireResult<AuthorizationModel> {
    model_from_json(input)
}

fn try_dsl(input: &str, config: &CompilerConfig) -> ParserResult<AuthorizationModel> {
    parse_with_config(input, config)
}

/// Parses `input` as JSON, falling back to DSL. No validation.
#[instrument(skip_all, fields(bytes = input.len()))]
pub fn parse_source(
    input: &str,
    config: &CompilerConfig,
) -> DomainResult<(AuthorizationModel, ModelFormat)> {
    if input.len() > config.max_input_bytes {
        return Err(DomainError::InputTooLarge {
            size: input.len(),
            limit: config.max_input_bytes,
        });
    }

    let json_err = match try_json(input) {
        Ok(model) => return Ok((model, ModelFormat::Json)),
        Err(e) => e,
    };
    debug!(error = %json_err, "input is not a JSON model, parsing as DSL");

    match try_dsl(input, config) {
        Ok(model) => Ok((model, ModelFormat::Dsl)),
        Err(dsl) => Err(DomainError::AmbiguousDualFormatParse {
            dsl,
            json: json_err,
        }),
    }
}

/// Compiles and validates a model with the default configuration.
pub fn compile(input: &str) -> DomainResult<AuthorizationModel> {
    compile_with(input, &CompilerConfig::default()).map(|(model, _)| model)
}

/// Compiles and validates a model, also reporting which format it was in.
pub fn compile_with(
    input: &str,
    config: &CompilerConfig,
) -> DomainResult<(AuthorizationModel, ModelFormat)> {
    let (model, format) = parse_source(input, config)?;
    validate(&model)?;
    debug!(
        ?format,
        types = model.type_definitions.len(),
        "compiled model"
    );
    Ok((model, format))
}

/// Compiles `input` and renders it as the OpenFGA JSON document.
pub fn dsl_to_json(input: &str, config: &CompilerConfig) -> DomainResult<Value> {
    let (model, _) = compile_with(input, config)?;
    Ok(model_to_json(&model))
}

/// Compiles `input` and renders it as canonical DSL.
pub fn json_to_dsl(input: &str, config: &CompilerConfig) -> DomainResult<String> {
    let (model, _) = compile_with(input, config)?;
    Ok(to_dsl(&model))
}

/// Extracts relationship metadata from JSON or DSL text.
///
/// Only parsing is required; a model still being edited yields metadata
/// even if it does not validate yet.
pub fn metadata_from_source(
    input: &str,
    config: &CompilerConfig,
) -> DomainResult<RelationshipMetadata> {
    let (model, _) = parse_source(input, config)?;
    Ok(extract_metadata_with(&model, config))
}
