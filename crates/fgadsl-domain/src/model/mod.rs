//! Authorization model types, DSL parser and DSL writer.
//!
//! This module contains:
//! - Core type definitions (AuthorizationModel, TypeDefinition, Userset, Condition)
//! - DSL parser for the OpenFGA model format
//! - DSL writer rendering a model back to canonical text

mod parser;
mod types;
#[cfg(test)]
mod types_proptest;
mod writer;

pub use parser::{
    is_valid_name, parse, parse_direct_user_types, parse_relation_expression, parse_with_config,
    ParseErrorKind, ParserError, ParserResult, RelationExpression,
};
pub use types::*;
pub use writer::{condition_to_dsl, to_dsl, userset_to_dsl};
