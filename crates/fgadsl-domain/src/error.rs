//! Domain error types for model compilation.

use thiserror::Error;

use crate::model::ParserError;
use crate::validation::ValidationError;
use crate::wire::WireError;

/// Domain-specific errors for model compilation.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Error parsing authorization model DSL.
    #[error("model parse error: {0}")]
    Parse(#[from] ParserError),

    /// Error reading authorization model JSON.
    #[error("model JSON error: {0}")]
    Wire(#[from] WireError),

    /// The model parsed but breaks one or more model invariants.
    #[error("model validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// Input is neither a JSON model nor valid DSL.
    #[error("input is not valid DSL ({dsl}); JSON attempt failed with: {json}")]
    AmbiguousDualFormatParse {
        #[source]
        dsl: ParserError,
        json: WireError,
    },

    /// Input exceeds the configured size limit.
    #[error("input is {size} bytes, limit is {limit}")]
    InputTooLarge { size: usize, limit: usize },
}

impl From<Vec<ValidationError>> for DomainError {
    fn from(errors: Vec<ValidationError>) -> Self {
        DomainError::Validation(errors)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
