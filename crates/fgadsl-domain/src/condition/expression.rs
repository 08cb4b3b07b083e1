//! Condition expression scanning and shape validation.
//!
//! This is not a CEL parser. The expression is split into a flat token
//! stream and checked by three passes:
//!
//! 1. every free identifier is a declared parameter (or a macro-bound name)
//! 2. every operator run is one of the supported operators
//! 3. parentheses, brackets and braces are balanced

use std::collections::HashSet;

use super::{ConditionError, ConditionResult};
use crate::model::ConditionParameter;

/// Operators accepted in condition expressions.
const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "<", "<=", ">", ">=", "&&", "||", "!",
];

/// Characters that form operator runs.
const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '%', '=', '!', '<', '>', '&', '|', '^', '~'];

/// Literal and keyword identifiers that never name a variable.
const RESERVED_WORDS: &[&str] = &["true", "false", "null", "in"];

/// Global functions that may be called without being declared.
const BUILTIN_FUNCTIONS: &[&str] = &[
    "size",
    "int",
    "uint",
    "double",
    "string",
    "bool",
    "bytes",
    "timestamp",
    "duration",
    "dyn",
    "type",
    "has",
    "matches",
];

/// Comprehension macros whose first argument binds a new name.
const BINDING_MACROS: &[&str] = &["all", "exists", "exists_one", "map", "filter"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExprToken {
    Ident(String),
    Number,
    Str,
    Operator(String),
    Dot,
    Comma,
    Open(char),
    Close(char),
    Punct(char),
}

fn malformed(condition: &str, message: impl Into<String>) -> ConditionError {
    ConditionError::MalformedExpression {
        condition: condition.to_string(),
        message: message.into(),
    }
}

/// Splits an expression into tokens.
pub(crate) fn tokenize(condition: &str, expression: &str) -> ConditionResult<Vec<ExprToken>> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '"' | '\'' => {
                let quote = c;
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(malformed(condition, "unterminated string literal"));
                }
                i += 1;
                tokens.push(ExprToken::Str);
            }
            c if c.is_ascii_digit() => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(ExprToken::Number);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(ExprToken::Ident(chars[start..i].iter().collect()));
            }
            '.' => {
                tokens.push(ExprToken::Dot);
                i += 1;
            }
            ',' => {
                tokens.push(ExprToken::Comma);
                i += 1;
            }
            '(' | '[' | '{' => {
                tokens.push(ExprToken::Open(c));
                i += 1;
            }
            ')' | ']' | '}' => {
                tokens.push(ExprToken::Close(c));
                i += 1;
            }
            '?' | ':' => {
                tokens.push(ExprToken::Punct(c));
                i += 1;
            }
            c if OPERATOR_CHARS.contains(&c) => {
                let start = i;
                while i < chars.len() && OPERATOR_CHARS.contains(&chars[i]) {
                    i += 1;
                }
                tokens.push(ExprToken::Operator(chars[start..i].iter().collect()));
            }
            other => {
                return Err(malformed(
                    condition,
                    format!("unexpected character '{other}'"),
                ))
            }
        }
    }

    Ok(tokens)
}

/// Returns true if an operator run is supported.
///
/// A binary operator may be followed by unary `!` / `-` prefixes
/// (`a &&!b`, `a <-1`).
pub(crate) fn is_valid_operator(run: &str) -> bool {
    let is_unary_chain = |s: &str| !s.is_empty() && s.chars().all(|c| c == '!' || c == '-');
    if OPERATORS.contains(&run) || is_unary_chain(run) {
        return true;
    }
    (1..run.len()).any(|k| OPERATORS.contains(&&run[..k]) && is_unary_chain(&run[k..]))
}

/// Names bound by comprehension macros, e.g. `x` in `list.exists(x, x > 2)`.
fn macro_bound_names(tokens: &[ExprToken]) -> HashSet<&str> {
    tokens
        .windows(5)
        .filter_map(|w| match w {
            [ExprToken::Dot, ExprToken::Ident(m), ExprToken::Open('('), ExprToken::Ident(v), ExprToken::Comma]
                if BINDING_MACROS.contains(&m.as_str()) =>
            {
                Some(v.as_str())
            }
            _ => None,
        })
        .collect()
}

fn check_identifiers(
    condition: &str,
    tokens: &[ExprToken],
    parameters: &[ConditionParameter],
) -> ConditionResult<()> {
    let mut declared: HashSet<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
    declared.extend(macro_bound_names(tokens));

    for (i, token) in tokens.iter().enumerate() {
        let ExprToken::Ident(name) = token else {
            continue;
        };
        let after_dot = i > 0 && tokens[i - 1] == ExprToken::Dot;
        let is_call = tokens.get(i + 1) == Some(&ExprToken::Open('('));
        if after_dot
            || RESERVED_WORDS.contains(&name.as_str())
            || (is_call && BUILTIN_FUNCTIONS.contains(&name.as_str()))
            || declared.contains(name.as_str())
        {
            continue;
        }
        return Err(ConditionError::UndeclaredVariable {
            condition: condition.to_string(),
            variable: name.clone(),
        });
    }
    Ok(())
}

fn check_operators(condition: &str, tokens: &[ExprToken]) -> ConditionResult<()> {
    for token in tokens {
        if let ExprToken::Operator(run) = token {
            if !is_valid_operator(run) {
                return Err(ConditionError::InvalidOperator {
                    condition: condition.to_string(),
                    operator: run.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_balance(condition: &str, tokens: &[ExprToken]) -> ConditionResult<()> {
    let mut stack = Vec::new();
    for token in tokens {
        match token {
            ExprToken::Open(c) => stack.push(*c),
            ExprToken::Close(c) => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err(malformed(condition, format!("unbalanced '{c}'")));
                }
            }
            _ => {}
        }
    }
    match stack.last() {
        Some(open) => Err(malformed(condition, format!("unclosed '{open}'"))),
        None => Ok(()),
    }
}

/// Validates the shape of a condition expression against its parameters.
///
/// # Errors
///
/// - `EmptyExpression` if the expression is blank
/// - `MalformedExpression` for stray characters, unterminated strings or
///   unbalanced brackets
/// - `UndeclaredVariable` for the first free identifier that is not a parameter
/// - `InvalidOperator` for the first unsupported operator run
pub fn validate_expression(
    condition: &str,
    expression: &str,
    parameters: &[ConditionParameter],
) -> ConditionResult<()> {
    if expression.trim().is_empty() {
        return Err(ConditionError::EmptyExpression {
            condition: condition.to_string(),
        });
    }

    let tokens = tokenize(condition, expression)?;
    check_identifiers(condition, &tokens, parameters)?;
    check_operators(condition, &tokens)?;
    check_balance(condition, &tokens)
}
