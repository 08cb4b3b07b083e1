//! DSL parser for OpenFGA authorization models.
//!
//! Parses the OpenFGA DSL format into AuthorizationModel structures.
//!
//! Example DSL:
//! ```text
//! model
//!   schema 1.1
//!
//! type user
//!
//! type document
//!   relations
//!     define owner: [user]
//!     define editor: [user, user:*] or owner
//!     define viewer: [user with non_expired_grant] or editor or viewer from parent
//!
//! condition non_expired_grant(current_time: timestamp, grant_time: timestamp, grant_duration: duration) {
//!   current_time < grant_time + grant_duration
//! }
//! ```
//!
//! Text is first split into statements by the line scanner, then each
//! statement is dispatched on its leading keyword.

mod direct;
mod lexer;
mod relation;

use std::collections::HashSet;

use tracing::{debug, trace};

pub use direct::parse_direct_user_types;
pub use relation::{parse_relation_expression, RelationExpression};

use self::lexer::{scan, starts_with_keyword, Statement};
use self::relation::{is_name_char, is_reserved};
use super::{AuthorizationModel, RelationDefinition, TypeDefinition};
use crate::condition::{parse_condition, ConditionErrorKind};
use crate::config::CompilerConfig;

/// Kinds of DSL parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A condition block has no closing `}` before end of input.
    UnterminatedConditionBlock,
    /// A `define` has nothing after the colon.
    EmptyRelationDefinition,
    /// A relation right-hand side is structurally invalid.
    InvalidRelationExpression,
    /// `and` / `but not` were used; only `or` is supported.
    UnsupportedOperator,
    /// More than one `[...]` list in one definition.
    DuplicateDirectAssignment,
    /// An entry of a `[...]` list is malformed.
    InvalidDirectUserType,
    /// A line that matches no statement form.
    UnexpectedStatement,
    /// A `define` or `relations` line outside a type.
    DefineOutsideType,
    /// A type, relation or condition name is not valid.
    InvalidName,
    DuplicateType,
    DuplicateRelation,
    DuplicateCondition,
    /// A condition block failed to parse or validate.
    Condition(ConditionErrorKind),
}

/// Parser error type with context for better error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// 1-based line of the offending statement, when known.
    pub line: Option<usize>,
}

impl ParserError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(kind: ParseErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line: Some(line),
        }
    }

    fn on_line(mut self, line: usize) -> Self {
        self.line.get_or_insert(line);
        self
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {}: {}", line, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParserError {}

/// Result type for parser operations.
pub type ParserResult<T> = Result<T, ParserError>;

/// Check if a string is a valid type, relation or condition reference name.
pub fn is_valid_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_name_char) && !is_reserved(s)
}

fn expect_name(kind_label: &str, name: &str, line: usize) -> ParserResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ParserError::at_line(
            ParseErrorKind::InvalidName,
            format!("invalid {kind_label} name '{name}'"),
            line,
        ))
    }
}

/// Accumulates statements into a model.
struct ModelBuilder {
    model: AuthorizationModel,
    current_type: Option<usize>,
    condition_names: HashSet<String>,
}

impl ModelBuilder {
    fn new(config: &CompilerConfig) -> Self {
        Self {
            model: AuthorizationModel::new(config.default_schema_version.clone()),
            current_type: None,
            condition_names: HashSet::new(),
        }
    }

    fn apply(&mut self, statement: &Statement) -> ParserResult<()> {
        let text = statement.text.as_str();
        let line = statement.line;
        trace!(line, statement = text, "dispatching statement");

        if statement.is_condition() {
            return self.condition(statement);
        }
        if text == "model" {
            return Ok(());
        }
        if let Some(version) = keyword_argument(text, "schema") {
            return self.schema(version, line);
        }
        if let Some(type_name) = keyword_argument(text, "type") {
            return self.type_definition(type_name, line);
        }
        if text == "relations" {
            return match self.current_type {
                Some(_) => Ok(()),
                None => Err(ParserError::at_line(
                    ParseErrorKind::DefineOutsideType,
                    "'relations' must follow a type declaration",
                    line,
                )),
            };
        }
        if starts_with_keyword(text, "define") {
            return self.define(&text["define".len()..], line);
        }

        Err(ParserError::at_line(
            ParseErrorKind::UnexpectedStatement,
            format!("unexpected statement '{text}'"),
            line,
        ))
    }

    fn schema(&mut self, version: &str, line: usize) -> ParserResult<()> {
        if version.split_whitespace().count() != 1 {
            return Err(ParserError::at_line(
                ParseErrorKind::UnexpectedStatement,
                format!("invalid schema version '{version}'"),
                line,
            ));
        }
        self.model.schema_version = version.to_string();
        Ok(())
    }

    fn type_definition(&mut self, type_name: &str, line: usize) -> ParserResult<()> {
        expect_name("type", type_name, line)?;
        if self.model.type_definition(type_name).is_some() {
            return Err(ParserError::at_line(
                ParseErrorKind::DuplicateType,
                format!("type '{type_name}' is defined more than once"),
                line,
            ));
        }
        self.model
            .type_definitions
            .push(TypeDefinition::new(type_name));
        self.current_type = Some(self.model.type_definitions.len() - 1);
        Ok(())
    }

    fn define(&mut self, rest: &str, line: usize) -> ParserResult<()> {
        let index = self.current_type.ok_or_else(|| {
            ParserError::at_line(
                ParseErrorKind::DefineOutsideType,
                "'define' must appear inside a type's relations",
                line,
            )
        })?;

        let (name, definition) = rest.split_once(':').ok_or_else(|| {
            ParserError::at_line(
                ParseErrorKind::UnexpectedStatement,
                format!("expected 'define <relation>: <expression>', found 'define{rest}'"),
                line,
            )
        })?;
        let name = name.trim();
        expect_name("relation", name, line)?;

        let type_def = &mut self.model.type_definitions[index];
        if type_def.relation(name).is_some() {
            return Err(ParserError::at_line(
                ParseErrorKind::DuplicateRelation,
                format!(
                    "relation '{}' is defined more than once on type '{}'",
                    name, type_def.type_name
                ),
                line,
            ));
        }

        let parsed = parse_relation_expression(definition).map_err(|e| e.on_line(line))?;
        type_def.relations.push(RelationDefinition::with_direct_types(
            name,
            parsed.rewrite,
            parsed.directly_related_user_types,
        ));
        Ok(())
    }

    fn condition(&mut self, statement: &Statement) -> ParserResult<()> {
        let condition = parse_condition(&statement.text).map_err(|e| {
            ParserError::at_line(
                ParseErrorKind::Condition(e.kind()),
                e.to_string(),
                statement.line,
            )
        })?;
        if !self.condition_names.insert(condition.name.clone()) {
            return Err(ParserError::at_line(
                ParseErrorKind::DuplicateCondition,
                format!("condition '{}' is defined more than once", condition.name),
                statement.line,
            ));
        }
        self.model.conditions.push(condition);
        // Conditions are top level; a following define needs a new type.
        self.current_type = None;
        Ok(())
    }
}

/// Returns the single argument of `keyword <arg>` lines.
fn keyword_argument<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    if !starts_with_keyword(text, keyword) {
        return None;
    }
    let arg = text[keyword.len()..].trim();
    (!arg.is_empty()).then_some(arg)
}

/// Parse a DSL string into an AuthorizationModel.
///
/// # Example
///
/// ```ignore
/// let dsl = r#"
/// model
///   schema 1.1
///
/// type user
///
/// type document
///   relations
///     define owner: [user]
///     define viewer: [user] or owner
/// "#;
///
/// let model = parse(dsl)?;
/// ```
pub fn parse(input: &str) -> ParserResult<AuthorizationModel> {
    parse_with_config(input, &CompilerConfig::default())
}

/// Parse a DSL string using the given compiler configuration.
pub fn parse_with_config(input: &str, config: &CompilerConfig) -> ParserResult<AuthorizationModel> {
    let statements = scan(input)?;
    let mut builder = ModelBuilder::new(config);
    for statement in &statements {
        builder.apply(statement)?;
    }

    debug!(
        statements = statements.len(),
        types = builder.model.type_definitions.len(),
        conditions = builder.model.conditions.len(),
        "parsed DSL model"
    );
    Ok(builder.model)
}
