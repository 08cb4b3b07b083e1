//! Condition block parsing and validation
//!
//! Conditions attach a parameterized boolean expression (a CEL subset) to
//! directly related user types. This module parses the DSL block form and
//! checks the expression's shape; it never evaluates an expression.
//!
//! # Example
//!
//! ```text
//! condition non_expired_grant(current_time: timestamp, grant_time: timestamp, grant_duration: duration) {
//!   current_time < grant_time + grant_duration
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               condition module                   │
//! ├─────────────────────────────────────────────────┤
//! │  parse_condition     - block shape + parameters │
//! │  validate_condition  - checks a built Condition │
//! │  validate_expression - token-level shape checks │
//! │  ConditionError      - condition-specific errors│
//! └─────────────────────────────────────────────────┘
//! ```

mod error;
mod expression;

use std::collections::HashSet;

use nom::{
    bytes::complete::{tag, take_till, take_until},
    character::complete::{char, multispace0},
    sequence::{delimited, preceded, tuple},
    IResult,
};
use tracing::trace;

pub use error::{ConditionError, ConditionErrorKind};
pub use expression::validate_expression;

use crate::model::{Condition, ConditionParameter, ParamType};

/// Result type for condition operations
pub type ConditionResult<T> = Result<T, ConditionError>;

/// Returns true if `s` matches `[a-zA-Z_][a-zA-Z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// `condition <name>(<params>) {` followed by the rest of the block.
fn block_head(input: &str) -> IResult<&str, (&str, &str)> {
    let (rest, (name, params)) = tuple((
        preceded(
            tuple((tag("condition"), multispace0)),
            take_till(|c| c == '(' || c == '{'),
        ),
        delimited(char('('), take_until(")"), char(')')),
    ))(input)?;
    let (rest, _) = preceded(multispace0, char('{'))(rest)?;
    Ok((rest, (name, params)))
}

fn parse_parameters(condition: &str, params: &str) -> ConditionResult<Vec<ConditionParameter>> {
    let params = params.trim();
    if params.is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::new();
    let mut parameters = Vec::new();
    for entry in params.split(',').map(str::trim) {
        let invalid = |reason: &str| ConditionError::InvalidParameter {
            condition: condition.to_string(),
            parameter: entry.to_string(),
            reason: reason.to_string(),
        };

        let (name, type_name) = entry
            .split_once(':')
            .ok_or_else(|| invalid("expected 'name: type'"))?;
        let (name, type_name) = (name.trim(), type_name.trim());

        if !is_identifier(name) {
            return Err(invalid("parameter name is not a valid identifier"));
        }
        let param_type: ParamType =
            type_name
                .parse()
                .map_err(|type_name| ConditionError::InvalidParameterType {
                    condition: condition.to_string(),
                    parameter: name.to_string(),
                    type_name,
                })?;
        if !seen.insert(name) {
            return Err(invalid("parameter is declared more than once"));
        }
        parameters.push(ConditionParameter::new(name, param_type));
    }
    Ok(parameters)
}

/// Parses one merged condition statement into a [`Condition`].
///
/// # Errors
///
/// Each violated rule yields its own [`ConditionError`] variant, checked in
/// this order: block shape, name, parameters, empty expression, undeclared
/// variables, operators.
pub fn parse_condition(statement: &str) -> ConditionResult<Condition> {
    let statement = statement.trim();
    let malformed = |message: &str| ConditionError::MalformedConditionBlock {
        message: format!("{message} in '{statement}'"),
    };

    let (body, (name, params)) = block_head(statement)
        .map_err(|_| malformed("expected 'condition <name>(<params>) { <expression> }'"))?;
    let expression = body
        .trim_end()
        .strip_suffix('}')
        .ok_or_else(|| malformed("missing closing '}'"))?
        .trim();

    let name = name.trim();
    if !is_identifier(name) {
        return Err(ConditionError::InvalidConditionName {
            name: name.to_string(),
        });
    }

    let parameters = parse_parameters(name, params)?;
    validate_expression(name, expression, &parameters)?;

    trace!(
        condition = name,
        parameters = parameters.len(),
        "parsed condition"
    );

    Ok(Condition {
        name: name.to_string(),
        parameters,
        expression: expression.to_string(),
    })
}

/// Validates a condition that did not come from DSL text (e.g. model JSON).
///
/// Besides the rules [`parse_condition`] applies, the expression must be in
/// the form a condition block yields: no surrounding whitespace and `\n`
/// line breaks only.
pub fn validate_condition(condition: &Condition) -> ConditionResult<()> {
    if !is_identifier(&condition.name) {
        return Err(ConditionError::InvalidConditionName {
            name: condition.name.clone(),
        });
    }
    let mut seen = HashSet::new();
    for param in &condition.parameters {
        if !is_identifier(&param.name) || !seen.insert(param.name.as_str()) {
            return Err(ConditionError::InvalidParameter {
                condition: condition.name.clone(),
                parameter: param.name.clone(),
                reason: "parameter names must be unique identifiers".to_string(),
            });
        }
    }
    let expression = condition.expression.as_str();
    let padded = expression.trim() != expression || expression.contains('\r');
    if padded && !expression.trim().is_empty() {
        return Err(ConditionError::MalformedExpression {
            condition: condition.name.clone(),
            message: "expression has surrounding whitespace or '\\r' line breaks".to_string(),
        });
    }
    validate_expression(&condition.name, expression, &condition.parameters)
}
