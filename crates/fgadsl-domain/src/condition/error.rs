//! Condition-specific error types

use thiserror::Error;

/// Errors raised while parsing or validating a condition block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// The block does not match `condition <name>(<params>) { <expression> }`
    #[error("malformed condition block: {message}")]
    MalformedConditionBlock {
        /// Description of what is missing
        message: String,
    },

    /// The condition name is not a valid identifier
    #[error("invalid condition name '{name}'")]
    InvalidConditionName { name: String },

    /// A parameter entry is not `name: type`, or repeats a name
    #[error("invalid parameter '{parameter}' in condition '{condition}': {reason}")]
    InvalidParameter {
        condition: String,
        parameter: String,
        reason: String,
    },

    /// A parameter declares a type outside the supported set
    #[error("invalid type '{type_name}' for parameter '{parameter}' in condition '{condition}'")]
    InvalidParameterType {
        condition: String,
        parameter: String,
        type_name: String,
    },

    /// The condition body is blank
    #[error("condition '{condition}' has an empty expression")]
    EmptyExpression { condition: String },

    /// The expression uses a name that is not a declared parameter
    #[error("undeclared variable '{variable}' in condition '{condition}'")]
    UndeclaredVariable { condition: String, variable: String },

    /// The expression contains an operator outside the supported set
    #[error("invalid operator '{operator}' in condition '{condition}'")]
    InvalidOperator { condition: String, operator: String },

    /// The expression is not well formed (unbalanced brackets, stray characters)
    #[error("malformed expression in condition '{condition}': {message}")]
    MalformedExpression { condition: String, message: String },
}

/// Discriminant of [`ConditionError`], for matching without payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionErrorKind {
    MalformedConditionBlock,
    InvalidConditionName,
    InvalidParameter,
    InvalidParameterType,
    EmptyExpression,
    UndeclaredVariable,
    InvalidOperator,
    MalformedExpression,
}

impl ConditionError {
    /// Returns the payload-free kind of this error
    pub fn kind(&self) -> ConditionErrorKind {
        match self {
            ConditionError::MalformedConditionBlock { .. } => {
                ConditionErrorKind::MalformedConditionBlock
            }
            ConditionError::InvalidConditionName { .. } => ConditionErrorKind::InvalidConditionName,
            ConditionError::InvalidParameter { .. } => ConditionErrorKind::InvalidParameter,
            ConditionError::InvalidParameterType { .. } => ConditionErrorKind::InvalidParameterType,
            ConditionError::EmptyExpression { .. } => ConditionErrorKind::EmptyExpression,
            ConditionError::UndeclaredVariable { .. } => ConditionErrorKind::UndeclaredVariable,
            ConditionError::InvalidOperator { .. } => ConditionErrorKind::InvalidOperator,
            ConditionError::MalformedExpression { .. } => ConditionErrorKind::MalformedExpression,
        }
    }
}
