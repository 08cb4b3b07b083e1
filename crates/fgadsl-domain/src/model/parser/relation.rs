//! Relation expression tokenizer and recursive-descent parser.
//!
//! Grammar for the right-hand side of `define name: <expr>`:
//!
//! ```text
//! expr    := term ("or" term)*
//! term    := "[" direct-list "]"
//!          | ident "from" ident
//!          | ident
//! ```

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, value},
    multi::many0,
    sequence::{delimited, terminated},
    IResult,
};

use super::direct::parse_direct_list;
use super::{ParseErrorKind, ParserError, ParserResult};
use crate::model::{DirectUserType, Userset};

/// Reserved keywords that cannot be used as identifiers.
const RESERVED_KEYWORDS: &[&str] = &["or", "and", "but", "not", "from", "with"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Or,
    And,
    But,
    Not,
    From,
    With,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    LBracket,
    RBracket,
    Comma,
    Hash,
    Colon,
    Star,
    Keyword(Keyword),
    Ident(&'a str),
}

impl Token<'_> {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Hash => "'#'".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Keyword(k) => format!("keyword '{}'", keyword_text(*k)),
            Token::Ident(name) => format!("'{name}'"),
        }
    }
}

fn keyword_text(keyword: Keyword) -> &'static str {
    match keyword {
        Keyword::Or => "or",
        Keyword::And => "and",
        Keyword::But => "but",
        Keyword::Not => "not",
        Keyword::From => "from",
        Keyword::With => "with",
    }
}

/// Check if a string is a reserved keyword
pub(crate) fn is_reserved(s: &str) -> bool {
    RESERVED_KEYWORDS.contains(&s)
}

/// Returns true for characters allowed in type, relation and condition names.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn word(input: &str) -> IResult<&str, Token<'_>> {
    map(take_while1(is_name_char), |w: &str| match w {
        "or" => Token::Keyword(Keyword::Or),
        "and" => Token::Keyword(Keyword::And),
        "but" => Token::Keyword(Keyword::But),
        "not" => Token::Keyword(Keyword::Not),
        "from" => Token::Keyword(Keyword::From),
        "with" => Token::Keyword(Keyword::With),
        _ => Token::Ident(w),
    })(input)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        value(Token::LBracket, char('[')),
        value(Token::RBracket, char(']')),
        value(Token::Comma, char(',')),
        value(Token::Hash, char('#')),
        value(Token::Colon, char(':')),
        value(Token::Star, char('*')),
        word,
    ))(input)
}

/// Splits a relation expression into tokens.
pub(crate) fn tokenize(input: &str) -> ParserResult<Vec<Token<'_>>> {
    let result: IResult<&str, Vec<Token<'_>>> =
        all_consuming(delimited(multispace0, many0(terminated(token, multispace0)), multispace0))(
            input,
        );
    match result {
        Ok((_, tokens)) => Ok(tokens),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offending = e.input.chars().next().unwrap_or(' ');
            Err(ParserError::new(
                ParseErrorKind::InvalidRelationExpression,
                format!(
                    "unexpected character '{}' at position {} in '{}'",
                    offending,
                    input.len() - e.input.len(),
                    input
                ),
            ))
        }
        Err(nom::Err::Incomplete(_)) => Err(ParserError::new(
            ParseErrorKind::InvalidRelationExpression,
            format!("incomplete relation expression '{input}'"),
        )),
    }
}

/// A parsed relation right-hand side: the rewrite tree plus the direct
/// user types of its (single) direct assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationExpression {
    pub rewrite: Userset,
    pub directly_related_user_types: Vec<DirectUserType>,
}

pub(crate) struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    source: &'t str,
}

impl<'t, 'a> Cursor<'t, 'a> {
    pub(crate) fn new(tokens: &'t [Token<'a>], source: &'t str) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
        }
    }

    pub(crate) fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    pub(crate) fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParserError {
        ParserError::new(
            ParseErrorKind::InvalidRelationExpression,
            format!("{} in '{}'", message.into(), self.source),
        )
    }

    pub(crate) fn expect_ident(&mut self, what: &str) -> ParserResult<&'a str> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(Token::Keyword(k)) if matches!(k, Keyword::And | Keyword::But | Keyword::Not) => {
                Err(unsupported(k, self.source))
            }
            Some(other) => Err(self.error(format!("expected {what}, found {}", other.describe()))),
            None => Err(self.error(format!("expected {what}, found end of expression"))),
        }
    }
}

fn unsupported(keyword: Keyword, source: &str) -> ParserError {
    let operator = match keyword {
        Keyword::And => "and",
        _ => "but not",
    };
    ParserError::new(
        ParseErrorKind::UnsupportedOperator,
        format!("the '{operator}' operator is not supported in '{source}'; only 'or' may combine clauses"),
    )
}

struct RelationParser<'t, 'a> {
    cursor: Cursor<'t, 'a>,
    direct: Option<Vec<DirectUserType>>,
}

impl<'t, 'a> RelationParser<'t, 'a> {
    /// expr := term ("or" term)*
    fn parse_expression(&mut self) -> ParserResult<Userset> {
        let mut children = vec![self.parse_term()?];
        loop {
            match self.cursor.peek() {
                Some(Token::Keyword(Keyword::Or)) => {
                    self.cursor.advance();
                    if self.cursor.is_done() {
                        return Err(self.cursor.error("dangling 'or'"));
                    }
                    children.push(self.parse_term()?);
                }
                Some(Token::Keyword(k @ (Keyword::And | Keyword::But | Keyword::Not))) => {
                    return Err(unsupported(k, self.cursor.source));
                }
                Some(other) => {
                    return Err(self
                        .cursor
                        .error(format!("unexpected {} after clause", other.describe())));
                }
                None => break,
            }
        }

        // The direct assignment always leads a union.
        Ok(Userset::union(children))
    }

    /// term := "[" direct-list "]" | ident "from" ident | ident
    fn parse_term(&mut self) -> ParserResult<Userset> {
        match self.cursor.peek() {
            Some(Token::LBracket) => {
                self.cursor.advance();
                let types = parse_direct_list(&mut self.cursor)?;
                if self.direct.is_some() {
                    return Err(ParserError::new(
                        ParseErrorKind::DuplicateDirectAssignment,
                        format!(
                            "only one direct assignment list is allowed in '{}'",
                            self.cursor.source
                        ),
                    ));
                }
                self.direct = Some(types);
                Ok(Userset::This)
            }
            Some(Token::Ident(_)) => {
                let relation = self.cursor.expect_ident("a relation name")?;
                if self.cursor.peek() == Some(Token::Keyword(Keyword::From)) {
                    self.cursor.advance();
                    let tupleset = self.cursor.expect_ident("a tupleset relation after 'from'")?;
                    Ok(Userset::tuple_to_userset(tupleset, relation))
                } else {
                    Ok(Userset::computed(relation))
                }
            }
            Some(Token::Keyword(k @ (Keyword::And | Keyword::But | Keyword::Not))) => {
                Err(unsupported(k, self.cursor.source))
            }
            Some(other) => Err(self
                .cursor
                .error(format!("expected a clause, found {}", other.describe()))),
            None => Err(self.cursor.error("expected a clause")),
        }
    }
}

/// Parses the right-hand side of a `define` statement.
///
/// # Errors
///
/// - `EmptyRelationDefinition` if `input` is blank
/// - `UnsupportedOperator` for `and` / `but not`
/// - `DuplicateDirectAssignment` for a second `[...]` list
/// - `InvalidRelationExpression` for any other malformed input
pub fn parse_relation_expression(input: &str) -> ParserResult<RelationExpression> {
    let source = input.trim();
    if source.is_empty() {
        return Err(ParserError::new(
            ParseErrorKind::EmptyRelationDefinition,
            "relation definition must not be empty",
        ));
    }

    let tokens = tokenize(source)?;
    let mut parser = RelationParser {
        cursor: Cursor::new(&tokens, source),
        direct: None,
    };
    let rewrite = parser.parse_expression()?;

    Ok(RelationExpression {
        rewrite,
        directly_related_user_types: parser.direct.unwrap_or_default(),
    })
}
